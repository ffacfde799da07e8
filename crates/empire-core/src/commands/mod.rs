//! Commands
//!
//! Player-facing operations on the [`WorldStore`](crate::store::WorldStore):
//! spawning, move orders, parties, structures and quests. Each one validates
//! its ids before touching the world, so a failed command leaves no partial
//! change behind.

pub mod movement;
pub mod party;
pub mod quest;
pub mod spawn;

pub use movement::move_label;
pub use spawn::{circle_points, grid_points, SpawnAgent, SpawnPattern, DEFAULT_ROSTER};
