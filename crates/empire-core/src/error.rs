//! Errors returned by the world store and the command surface.
//!
//! The tick loop itself never fails: missing entities are skipped.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    #[error("unknown dragon: {0}")]
    UnknownDragon(String),
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("unknown party: {0}")]
    UnknownParty(String),
    #[error("unknown quest: {0}")]
    UnknownQuest(String),
    #[error("unknown questline: {0}")]
    UnknownQuestline(String),
    #[error("unknown structure: {0}")]
    UnknownStructure(String),
    #[error("non-finite position for {id}: {position:?}")]
    NonFinitePosition { id: String, position: [f32; 3] },
    #[error("non-finite health for {id}: {value}")]
    NonFiniteHealth { id: String, value: f32 },
    #[error("agent limit of {limit} reached")]
    AgentLimitReached { limit: usize },
    #[error("agent {agent_id} is not a member of party {party_id}")]
    NotPartyMember { party_id: String, agent_id: String },
    #[error("a party needs at least one member")]
    EmptyParty,
    #[error("quest {quest_id} is locked by unfinished prerequisites: {missing:?}")]
    QuestLocked {
        quest_id: String,
        missing: Vec<String>,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
