//! Agent Components
//!
//! Components for individual agents: identity, behavior, health, task.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use empire_events::{AgentStateKind, SimTime};

/// Marker component identifying an entity as an agent
#[derive(Component, Debug, Clone, Default)]
pub struct Agent;

/// Unique identifier for an agent
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

/// Pending destination. `None` when the agent is not travelling.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveTarget(pub Option<Vec3>);

/// Simulated time of the agent's last movement step
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct LastMove(pub Option<SimTime>);

/// Behavioral state tagged with the time it was entered.
///
/// `entered_at` is `None` only when the state was set without access to the
/// simulation clock; the state machine stamps it on the next tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub kind: AgentStateKind,
    pub entered_at: Option<SimTime>,
}

impl Behavior {
    pub fn new(kind: AgentStateKind) -> Self {
        Self {
            kind,
            entered_at: None,
        }
    }

    pub fn entered(kind: AgentStateKind, at: SimTime) -> Self {
        Self {
            kind,
            entered_at: Some(at),
        }
    }

    pub fn idle(at: SimTime) -> Self {
        Self::entered(AgentStateKind::Idle, at)
    }

    /// Time spent in the current state, if the entry time is known
    pub fn elapsed(&self, now: SimTime) -> Option<Duration> {
        self.entered_at.map(|at| now.since(at))
    }

    pub fn is(&self, kind: AgentStateKind) -> bool {
        self.kind == kind
    }
}

/// Hit points. `current` never drops below zero.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Fraction of max health remaining (0.0 when max is zero)
    pub fn ratio(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    pub fn is_down(&self) -> bool {
        self.current <= 0.0
    }

    /// Subtract damage, flooring at zero. Returns the new value.
    pub fn apply_damage(&mut self, damage: u32) -> f32 {
        self.current = (self.current - damage as f32).max(0.0);
        self.current
    }
}

/// What the agent is doing, as shown to the player, plus work waiting for
/// it at its destination.
#[derive(Component, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    pub label: String,
    /// Task started on arrival; the agent goes to WORKING instead of IDLE
    pub queued: Option<String>,
}

impl Task {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            queued: None,
        }
    }

    pub fn with_queued(mut self, task: impl Into<String>) -> Self {
        self.queued = Some(task.into());
        self
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }
}

/// Experience level, raised by quest rewards
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level(pub u32);

impl Default for Level {
    fn default() -> Self {
        Level(1)
    }
}

/// Party the agent belongs to
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyMembership(pub Option<String>);

/// Agent that spawned this one as a subagent
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentAgent(pub Option<String>);
