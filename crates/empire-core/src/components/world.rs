//! World Components
//!
//! Positions, the simulation clock, the id index and the structure registry.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use empire_events::{GameClock, SimTime};

/// Component: an entity's location in the scene
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    pub fn as_array(&self) -> [f32; 3] {
        self.0.to_array()
    }
}

/// Human-readable name for an agent or dragon
#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(pub String);

/// Resource: simulated time. Advanced by exactly one tick interval per tick.
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    pub current_tick: u64,
    pub now: SimTime,
    pub tick_interval: Duration,
}

impl SimClock {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            current_tick: 0,
            now: SimTime::ZERO,
            tick_interval,
        }
    }

    /// Update the clock for a new tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
        self.now += self.tick_interval;
    }

    pub fn game_clock(&self) -> GameClock {
        GameClock::from(self.now)
    }
}

/// Resource: maps string ids to ECS entities
#[derive(Resource, Debug, Default)]
pub struct EntityIndex {
    entities: HashMap<String, Entity>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, entity: Entity) {
        self.entities.insert(id.into(), entity);
    }

    pub fn get(&self, id: &str) -> Option<Entity> {
        self.entities.get(id).copied()
    }

    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// All ids, sorted
    pub fn sorted_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entities.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Resource: deterministic per-prefix id counters
#[derive(Resource, Debug, Default)]
pub struct IdGenerator {
    counters: HashMap<&'static str, u64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next id for a prefix, e.g. `agent_0001`
    pub fn next(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{}_{:04}", prefix, counter)
    }
}

/// Kind of goal structure placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Home base and spawn point
    Base,
    /// Main goal
    Castle,
    /// Sub-goal
    Tower,
    /// Task site
    Workshop,
    /// Gathering point
    Campfire,
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StructureKind::Base => "base",
            StructureKind::Castle => "castle",
            StructureKind::Tower => "tower",
            StructureKind::Workshop => "workshop",
            StructureKind::Campfire => "campfire",
        };
        f.write_str(name)
    }
}

/// A structure agents can be sent to
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub id: String,
    pub kind: StructureKind,
    pub name: String,
    pub description: String,
    pub position: Vec3,
    pub goal_id: Option<String>,
}

/// Resource: registry of all structures
#[derive(Resource, Debug, Default)]
pub struct StructureRegistry {
    structures: BTreeMap<String, Structure>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a structure
    pub fn register(&mut self, structure: Structure) {
        self.structures.insert(structure.id.clone(), structure);
    }

    /// Get a structure by ID
    pub fn get(&self, structure_id: &str) -> Option<&Structure> {
        self.structures.get(structure_id)
    }

    pub fn get_mut(&mut self, structure_id: &str) -> Option<&mut Structure> {
        self.structures.get_mut(structure_id)
    }

    pub fn remove(&mut self, structure_id: &str) -> Option<Structure> {
        self.structures.remove(structure_id)
    }

    /// Get all structures, ordered by id
    pub fn all(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    /// Get structures of a specific kind
    pub fn of_kind(&self, kind: StructureKind) -> Vec<&Structure> {
        self.structures.values().filter(|s| s.kind == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}
