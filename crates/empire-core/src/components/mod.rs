//! ECS Components
//!
//! Entity components and world resources for agents, dragons, parties,
//! quests, and structures.

pub mod agent;
pub mod dragon;
pub mod party;
pub mod quest;
pub mod world;

pub use agent::*;
pub use dragon::*;
pub use party::*;
pub use quest::*;
pub use world::*;
