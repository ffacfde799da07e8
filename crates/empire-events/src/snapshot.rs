//! Snapshot Types
//!
//! Serialization structs for world snapshots.
//!
//! Snapshots capture the complete state of the simulation at a point in time,
//! used for inspection, debugging and driving an external renderer.

use serde::{Deserialize, Serialize};

use crate::{AgentStateKind, QuestStatus, QuestlineStatus, SimTime};

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Agent snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub name: String,
    pub position: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<[f32; 3]>,
    pub state: AgentStateKind,
    pub health: f32,
    pub max_health: f32,
    pub current_task: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Dragon snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragonSnapshot {
    pub dragon_id: String,
    pub name: String,
    pub position: [f32; 3],
    pub health: f32,
    pub max_health: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent_id: Option<String>,
}

/// Party snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub party_id: String,
    pub name: String,
    pub formation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<String>,
    pub member_ids: Vec<String>,
    pub total_health: f32,
    pub total_max_health: f32,
}

/// Structure snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureSnapshot {
    pub structure_id: String,
    pub kind: String,
    pub name: String,
    pub position: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
}

/// Quest snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestSnapshot {
    pub quest_id: String,
    pub title: String,
    pub status: QuestStatus,
    pub unlocked: bool,
    pub required_agents: usize,
    #[serde(default)]
    pub assigned_agent_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questline_id: Option<String>,
}

/// Questline snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestlineSnapshot {
    pub questline_id: String,
    pub name: String,
    pub status: QuestlineStatus,
    pub current_quest_index: usize,
    pub completed_quests: usize,
    pub required_completed_quests: usize,
}

/// Aggregate counters shown in the HUD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_agents: usize,
    /// Agents in any state other than IDLE.
    pub active_agents: usize,
    pub idle_agents: usize,
    pub total_dragons: usize,
    pub active_quests: usize,
    pub completed_quests: usize,
    pub average_level: f32,
}

/// Complete world snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub snapshot_id: String,
    pub tick: u64,
    pub sim_time: SimTime,
    /// Session clock formatted `MM:SS`.
    pub clock: String,
    #[serde(default)]
    pub agents: Vec<AgentSnapshot>,
    #[serde(default)]
    pub dragons: Vec<DragonSnapshot>,
    #[serde(default)]
    pub parties: Vec<PartySnapshot>,
    #[serde(default)]
    pub structures: Vec<StructureSnapshot>,
    #[serde(default)]
    pub quests: Vec<QuestSnapshot>,
    #[serde(default)]
    pub questlines: Vec<QuestlineSnapshot>,
    pub stats: GameStats,
}

impl WorldSnapshot {
    /// Look up an agent by ID.
    pub fn agent(&self, agent_id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    /// Look up a dragon by ID.
    pub fn dragon(&self, dragon_id: &str) -> Option<&DragonSnapshot> {
        self.dragons.iter().find(|d| d.dragon_id == dragon_id)
    }
}
