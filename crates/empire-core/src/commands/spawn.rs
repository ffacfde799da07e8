//! Spawning and despawning agents and dragons.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use empire_events::EventKind;

use crate::components::agent::{
    Agent, AgentId, Behavior, Health, LastMove, Level, MoveTarget, ParentAgent, PartyMembership, Task,
};
use crate::components::dragon::{Dragon, DragonId, DragonTarget};
use crate::components::world::{DisplayName, EntityIndex, Position};
use crate::error::{StoreError, StoreResult};
use crate::store::{ensure_finite, DragonPatch, WorldStore};
use crate::SimRng;

/// Names given to agents spawned without one
pub const DEFAULT_ROSTER: &[&str] = &[
    "Sir Query",
    "Lady Parser",
    "Knight Coder",
    "Scribe Writer",
    "Wizard Debug",
];

/// Request to spawn a single agent
#[derive(Debug, Clone, Default)]
pub struct SpawnAgent {
    /// Picked from [`DEFAULT_ROSTER`] when absent
    pub name: Option<String>,
    /// Random point around the spawn base when absent
    pub position: Option<Vec3>,
    /// Agent that spawned this one
    pub parent_id: Option<String>,
}

/// Layout for batch spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnPattern {
    Grid,
    Circle,
    #[default]
    Random,
}

impl fmt::Display for SpawnPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnPattern::Grid => write!(f, "grid"),
            SpawnPattern::Circle => write!(f, "circle"),
            SpawnPattern::Random => write!(f, "random"),
        }
    }
}

impl FromStr for SpawnPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(SpawnPattern::Grid),
            "circle" => Ok(SpawnPattern::Circle),
            "random" => Ok(SpawnPattern::Random),
            other => Err(format!("unknown spawn pattern: '{}'", other)),
        }
    }
}

/// Square grid of `count` points starting at `base - offset`
pub fn grid_points(base: Vec3, count: usize, spacing: f32) -> Vec<Vec3> {
    let size = (count as f32).sqrt().ceil().max(1.0) as usize;
    let offset = size as f32 * spacing / 2.0;
    (0..count)
        .map(|i| {
            let (row, col) = ((i / size) as f32, (i % size) as f32);
            Vec3::new(
                base.x + col * spacing - offset,
                base.y,
                base.z + row * spacing - offset,
            )
        })
        .collect()
}

/// `count` points evenly spaced on a circle around `base`
pub fn circle_points(base: Vec3, count: usize, radius: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            Vec3::new(
                base.x + angle.cos() * radius,
                base.y,
                base.z + angle.sin() * radius,
            )
        })
        .collect()
}

impl WorldStore {
    fn spawn_base(&self) -> Vec3 {
        Vec3::from_array(self.config().agents.spawn_base)
    }

    fn random_point_around(&mut self, base: Vec3) -> Vec3 {
        let radius = self.config().agents.spawn_radius;
        if radius <= 0.0 {
            return base;
        }
        let mut rng = self.world_mut().resource_mut::<SimRng>();
        let dx = rng.0.gen_range(-radius..=radius);
        let dz = rng.0.gen_range(-radius..=radius);
        Vec3::new(base.x + dx, base.y, base.z + dz)
    }

    fn roster_name(&mut self) -> String {
        let pick = self
            .world_mut()
            .resource_mut::<SimRng>()
            .0
            .gen_range(0..DEFAULT_ROSTER.len());
        DEFAULT_ROSTER[pick].to_string()
    }

    pub fn spawn_agent(&mut self, request: SpawnAgent) -> StoreResult<String> {
        let limit = self.config().agents.max_agents;
        if self.agent_count() >= limit {
            return Err(StoreError::AgentLimitReached { limit });
        }
        if let Some(position) = request.position {
            ensure_finite("new agent", position)?;
        }
        if let Some(parent) = &request.parent_id {
            self.agent_entity(parent)?;
        }

        let name = match request.name {
            Some(name) => name,
            None => self.roster_name(),
        };
        let position = match request.position {
            Some(position) => position,
            None => {
                let base = self.spawn_base();
                self.random_point_around(base)
            }
        };
        let id = self.next_id("agent");
        let now = self.now();
        let max_health = self.config().agents.max_health;
        let idle_label = self.config().states.idle_task_label.clone();

        let world = self.world_mut();
        let entity = world
            .spawn((
                Agent,
                AgentId(id.clone()),
                DisplayName(name.clone()),
                Position(position),
                MoveTarget::default(),
                LastMove::default(),
                Behavior::idle(now),
                Health::full(max_health),
                Task::new(idle_label),
                Level::default(),
                PartyMembership::default(),
                ParentAgent(request.parent_id),
            ))
            .id();
        world.resource_mut::<EntityIndex>().insert(id.clone(), entity);

        tracing::debug!("Spawned {} ({}) at {}", id, name, position);
        self.record(EventKind::AgentSpawned {
            agent_id: id.clone(),
            name,
            position: position.to_array(),
        });
        Ok(id)
    }

    /// Spawn up to `count` agents laid out around `base` (the spawn base by
    /// default). The batch is cut short at the agent limit.
    pub fn spawn_batch(
        &mut self,
        count: usize,
        pattern: SpawnPattern,
        base: Option<Vec3>,
    ) -> StoreResult<Vec<String>> {
        let limit = self.config().agents.max_agents;
        let capacity = limit.saturating_sub(self.agent_count());
        if capacity == 0 && count > 0 {
            return Err(StoreError::AgentLimitReached { limit });
        }
        let actual = count.min(capacity);
        if actual < count {
            tracing::warn!(
                "Reducing spawn batch from {} to {} to respect the limit of {}",
                count,
                actual,
                limit
            );
        }

        let base = base.unwrap_or_else(|| self.spawn_base());
        ensure_finite("spawn base", base)?;
        let positions = match pattern {
            SpawnPattern::Grid => grid_points(base, actual, self.config().agents.grid_spacing),
            SpawnPattern::Circle => circle_points(base, actual, self.config().agents.spawn_radius),
            SpawnPattern::Random => (0..actual).map(|_| self.random_point_around(base)).collect(),
        };

        let ids = positions
            .into_iter()
            .map(|position| {
                self.spawn_agent(SpawnAgent {
                    position: Some(position),
                    ..Default::default()
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        tracing::info!("Spawned {} agents in a {} pattern", ids.len(), pattern);
        Ok(ids)
    }

    pub fn despawn_agent(&mut self, agent_id: &str) -> StoreResult<()> {
        self.agent_entity(agent_id)?;
        self.remove(agent_id)
    }

    /// Remove every agent. Returns how many were removed.
    pub fn despawn_all_agents(&mut self) -> usize {
        let ids: Vec<String> = self.agents().into_iter().map(|a| a.id).collect();
        let removed = ids.iter().filter(|id| self.remove(id).is_ok()).count();
        tracing::info!("Despawned {} agents", removed);
        removed
    }

    pub fn spawn_dragon(
        &mut self,
        name: Option<String>,
        position: Vec3,
        target_agent_id: Option<String>,
    ) -> StoreResult<String> {
        ensure_finite("new dragon", position)?;
        if let Some(target) = &target_agent_id {
            self.agent_entity(target)?;
        }

        let id = self.next_id("dragon");
        let max_health = self.config().dragons.max_health;
        let name = name.unwrap_or_else(|| "Dragon".to_string());
        let world = self.world_mut();
        let entity = world
            .spawn((
                Dragon,
                DragonId(id.clone()),
                DisplayName(name),
                Position(position),
                Health::full(max_health),
                DragonTarget(target_agent_id),
            ))
            .id();
        world.resource_mut::<EntityIndex>().insert(id.clone(), entity);

        tracing::info!("Spawned {} at {}", id, position);
        self.record(EventKind::DragonSpawned {
            dragon_id: id.clone(),
            position: position.to_array(),
        });
        Ok(id)
    }

    /// Point a dragon at an agent, or call it off with `None`
    pub fn set_dragon_target(&mut self, dragon_id: &str, agent_id: Option<&str>) -> StoreResult<()> {
        self.update_dragon(
            dragon_id,
            DragonPatch {
                target: Some(agent_id.map(str::to_string)),
                ..Default::default()
            },
        )
    }
}
