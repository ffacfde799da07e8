//! Event Types
//!
//! Records emitted by the tick loop and the command surface. Events are
//! written one per line (JSONL) by the core's event logger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SimTime;

/// Behavioral phase of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStateKind {
    Idle,
    Thinking,
    Moving,
    Working,
    Completing,
    Combat,
    Error,
}

impl AgentStateKind {
    pub fn all() -> &'static [AgentStateKind] {
        &[
            AgentStateKind::Idle,
            AgentStateKind::Thinking,
            AgentStateKind::Moving,
            AgentStateKind::Working,
            AgentStateKind::Completing,
            AgentStateKind::Combat,
            AgentStateKind::Error,
        ]
    }

    /// States that leave on their own after a fixed duration.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            AgentStateKind::Thinking | AgentStateKind::Working | AgentStateKind::Completing
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStateKind::Idle => "IDLE",
            AgentStateKind::Thinking => "THINKING",
            AgentStateKind::Moving => "MOVING",
            AgentStateKind::Working => "WORKING",
            AgentStateKind::Completing => "COMPLETING",
            AgentStateKind::Combat => "COMBAT",
            AgentStateKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for AgentStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a state name is not recognized.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseStateError(pub String);

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown agent state: '{}'", self.0)
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for AgentStateKind {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentStateKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseStateError(s.to_string()))
    }
}

/// Lifecycle of a single quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Lifecycle of a questline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestlineStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    AgentSpawned {
        agent_id: String,
        name: String,
        position: [f32; 3],
    },
    AgentDespawned {
        agent_id: String,
    },
    DragonSpawned {
        dragon_id: String,
        position: [f32; 3],
    },
    MoveOrdered {
        agent_id: String,
        target: [f32; 3],
    },
    AgentArrived {
        agent_id: String,
        position: [f32; 3],
    },
    StateChanged {
        agent_id: String,
        from: AgentStateKind,
        to: AgentStateKind,
    },
    ReinforcementsCalled {
        agent_id: String,
        dragon_id: String,
        joined: Vec<String>,
    },
    AgentDamaged {
        agent_id: String,
        dragon_id: String,
        damage: u32,
        health: f32,
    },
    AgentDowned {
        agent_id: String,
        dragon_id: String,
    },
    QuestStatusChanged {
        quest_id: String,
        from: QuestStatus,
        to: QuestStatus,
    },
    QuestlineAdvanced {
        questline_id: String,
        current_quest_index: usize,
        status: QuestlineStatus,
    },
}

impl EventKind {
    /// The agent this event is about, if any.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            EventKind::AgentSpawned { agent_id, .. }
            | EventKind::AgentDespawned { agent_id }
            | EventKind::MoveOrdered { agent_id, .. }
            | EventKind::AgentArrived { agent_id, .. }
            | EventKind::StateChanged { agent_id, .. }
            | EventKind::ReinforcementsCalled { agent_id, .. }
            | EventKind::AgentDamaged { agent_id, .. }
            | EventKind::AgentDowned { agent_id, .. } => Some(agent_id),
            EventKind::DragonSpawned { .. }
            | EventKind::QuestStatusChanged { .. }
            | EventKind::QuestlineAdvanced { .. } => None,
        }
    }
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub event_id: String,
    pub tick: u64,
    pub at: SimTime,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SimEvent {
    pub fn new(event_id: impl Into<String>, tick: u64, at: SimTime, kind: EventKind) -> Self {
        Self {
            event_id: event_id.into(),
            tick,
            at,
            kind,
        }
    }

    /// Checks if a specific agent is the subject of this event.
    pub fn involves_agent(&self, agent_id: &str) -> bool {
        match &self.kind {
            EventKind::ReinforcementsCalled {
                agent_id: caller,
                joined,
                ..
            } => caller == agent_id || joined.iter().any(|id| id == agent_id),
            kind => kind.agent_id() == Some(agent_id),
        }
    }

    /// Serializes the event to a JSON line (for JSONL format).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}
