//! Agents of Empire Simulation Core
//!
//! The fixed-rate world behind the game: agents walk, think and work, call
//! for help when a dragon wears them down, and dragons chase and bite.
//! Everything lives in one bevy_ecs [`World`](bevy_ecs::world::World) owned
//! by the [`WorldStore`].

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod commands;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod scheduler;
pub mod setup;
pub mod simulation;
pub mod store;
pub mod systems;

pub use config::{Config, ConfigError};
pub use error::{StoreError, StoreResult};
pub use scheduler::{FrameReport, TickScheduler};
pub use simulation::{build_schedule, Simulation};
pub use store::{AgentPatch, AgentView, DragonPatch, DragonView, EntityKind, EntityView, WorldStore};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
