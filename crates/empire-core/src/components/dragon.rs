//! Dragon Components
//!
//! Hostile entities that chase a target agent and bite it when close.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component identifying an entity as a dragon
#[derive(Component, Debug, Clone, Default)]
pub struct Dragon;

/// Unique identifier for a dragon
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragonId(pub String);

/// Agent the dragon is hunting
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct DragonTarget(pub Option<String>);
