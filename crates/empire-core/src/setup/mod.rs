//! World Setup
//!
//! Starting structures, questline, agents and dragons.

pub mod agents;
pub mod world;

pub use agents::*;
pub use world::*;
