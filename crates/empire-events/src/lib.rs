//! Shared event types and serialization for the Agents of Empire simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for the simulation core and for anything that reads
//! its event logs or snapshots.

pub mod event;
pub mod snapshot;
pub mod timestamp;

// Re-export timestamp types
pub use timestamp::{GameClock, ParseClockError, SimTime};

// Re-export event types
pub use event::*;

// Re-export snapshot types
pub use snapshot::{
    generate_snapshot_id, AgentSnapshot, DragonSnapshot, GameStats, PartySnapshot,
    QuestSnapshot, QuestlineSnapshot, StructureSnapshot, WorldSnapshot,
};
