//! World State Store
//!
//! Owns the ECS [`World`] and exposes keyed access to agents, dragons and
//! structures. Every tick pass and every command goes through this one
//! object; there is no other copy of the game state.

use bevy_ecs::prelude::*;
use bevy_ecs::system::RunSystemOnce;
use bevy_ecs::world::EntityRef;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use empire_events::{AgentStateKind, EventKind, SimEvent, SimTime};

use crate::components::agent::{
    Agent, AgentId, Behavior, Health, LastMove, Level, MoveTarget, ParentAgent, PartyMembership, Task,
};
use crate::components::dragon::{Dragon, DragonId, DragonTarget};
use crate::components::party::PartyRegistry;
use crate::components::quest::QuestBoard;
use crate::components::world::{
    DisplayName, EntityIndex, IdGenerator, Position, SimClock, Structure, StructureRegistry,
};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::events::{drain_tick_events, record_event, EventLog, EventLogger, TickEvents};
use crate::systems::{ReinforcementCallers, ReinforcementRequests};
use crate::SimRng;

/// Kind of entity held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Agent,
    Dragon,
    Structure,
}

/// Read-only copy of an agent's state
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub target: Option<Vec3>,
    pub behavior: Behavior,
    pub health: Health,
    pub task: Task,
    pub level: u32,
    pub party_id: Option<String>,
    pub parent_id: Option<String>,
}

impl AgentView {
    fn read(entity: EntityRef) -> Option<Self> {
        entity.get::<Agent>()?;
        Some(Self {
            id: entity.get::<AgentId>()?.0.clone(),
            name: entity
                .get::<DisplayName>()
                .map(|n| n.0.clone())
                .unwrap_or_default(),
            position: entity.get::<Position>()?.0,
            target: entity.get::<MoveTarget>().and_then(|t| t.0),
            behavior: *entity.get::<Behavior>()?,
            health: *entity.get::<Health>()?,
            task: entity.get::<Task>().cloned().unwrap_or_default(),
            level: entity.get::<Level>().map_or(1, |l| l.0),
            party_id: entity.get::<PartyMembership>().and_then(|p| p.0.clone()),
            parent_id: entity.get::<ParentAgent>().and_then(|p| p.0.clone()),
        })
    }

    pub fn state(&self) -> AgentStateKind {
        self.behavior.kind
    }
}

/// Read-only copy of a dragon's state
#[derive(Debug, Clone, PartialEq)]
pub struct DragonView {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub health: Health,
    pub target_agent_id: Option<String>,
}

impl DragonView {
    fn read(entity: EntityRef) -> Option<Self> {
        entity.get::<Dragon>()?;
        Some(Self {
            id: entity.get::<DragonId>()?.0.clone(),
            name: entity
                .get::<DisplayName>()
                .map(|n| n.0.clone())
                .unwrap_or_default(),
            position: entity.get::<Position>()?.0,
            health: entity.get::<Health>().copied().unwrap_or(Health::full(0.0)),
            target_agent_id: entity.get::<DragonTarget>().and_then(|t| t.0.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityView {
    Agent(AgentView),
    Dragon(DragonView),
    Structure(Structure),
}

impl EntityView {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityView::Agent(_) => EntityKind::Agent,
            EntityView::Dragon(_) => EntityKind::Dragon,
            EntityView::Structure(_) => EntityKind::Structure,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityView::Agent(a) => &a.id,
            EntityView::Dragon(d) => &d.id,
            EntityView::Structure(s) => &s.id,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            EntityView::Agent(a) => a.position,
            EntityView::Dragon(d) => d.position,
            EntityView::Structure(s) => s.position,
        }
    }
}

/// Partial update for an agent. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub position: Option<Vec3>,
    /// `Some(None)` cancels an in-flight move
    pub target: Option<Option<Vec3>>,
    /// Entering a state stamps it with the current simulated time
    pub state: Option<AgentStateKind>,
    pub health: Option<f32>,
    pub max_health: Option<f32>,
    pub task: Option<String>,
    pub queued_task: Option<Option<String>>,
    pub level: Option<u32>,
}

impl AgentPatch {
    pub fn with_state(mut self, state: AgentStateKind) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_task(mut self, label: impl Into<String>) -> Self {
        self.task = Some(label.into());
        self
    }

    pub fn with_target(mut self, target: Option<Vec3>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }
}

/// Partial update for a dragon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragonPatch {
    pub name: Option<String>,
    pub position: Option<Vec3>,
    pub target: Option<Option<String>>,
    pub health: Option<f32>,
}

pub(crate) fn ensure_finite(id: &str, position: Vec3) -> StoreResult<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(StoreError::NonFinitePosition {
            id: id.to_string(),
            position: position.to_array(),
        })
    }
}

fn ensure_finite_health(id: &str, value: f32) -> StoreResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StoreError::NonFiniteHealth {
            id: id.to_string(),
            value,
        })
    }
}

/// The game state
pub struct WorldStore {
    world: World,
}

impl WorldStore {
    /// Empty world with all simulation resources installed
    pub fn new(config: Config, seed: u64) -> Self {
        let mut world = World::new();
        world.insert_resource(SimClock::new(config.simulation.tick_interval()));
        world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
        world.insert_resource(config);
        world.insert_resource(EntityIndex::new());
        world.insert_resource(IdGenerator::new());
        world.insert_resource(StructureRegistry::new());
        world.insert_resource(PartyRegistry::new());
        world.insert_resource(QuestBoard::new());
        world.insert_resource(TickEvents::new());
        world.insert_resource(EventLog::default());
        world.insert_resource(ReinforcementCallers::default());
        world.insert_resource(ReinforcementRequests::default());
        Self { world }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &Config {
        self.world.resource::<Config>()
    }

    pub fn clock(&self) -> &SimClock {
        self.world.resource::<SimClock>()
    }

    pub fn now(&self) -> SimTime {
        self.clock().now
    }

    pub fn structures(&self) -> &StructureRegistry {
        self.world.resource::<StructureRegistry>()
    }

    pub fn parties(&self) -> &PartyRegistry {
        self.world.resource::<PartyRegistry>()
    }

    pub fn quests(&self) -> &QuestBoard {
        self.world.resource::<QuestBoard>()
    }

    /// Write every future event to a JSONL logger as well
    pub fn attach_logger(&mut self, logger: EventLogger) {
        self.world.insert_resource(logger);
    }

    pub fn flush_logger(&mut self) -> std::io::Result<()> {
        match self.world.get_resource_mut::<EventLogger>() {
            Some(mut logger) => logger.flush(),
            None => Ok(()),
        }
    }

    /// Collect every event recorded so far, including ones from commands
    /// issued since the last tick
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        self.world.run_system_once(drain_tick_events);
        self.world.resource_mut::<EventLog>().take()
    }

    pub(crate) fn record(&mut self, kind: EventKind) {
        record_event(&mut self.world, kind);
    }

    pub(crate) fn next_id(&mut self, prefix: &'static str) -> String {
        self.world.resource_mut::<IdGenerator>().next(prefix)
    }

    fn entity(&self, id: &str) -> Option<Entity> {
        self.world.resource::<EntityIndex>().get(id)
    }

    pub(crate) fn agent_entity(&self, agent_id: &str) -> StoreResult<Entity> {
        self.entity(agent_id)
            .filter(|e| self.world.get::<Agent>(*e).is_some())
            .ok_or_else(|| StoreError::UnknownAgent(agent_id.to_string()))
    }

    pub(crate) fn dragon_entity(&self, dragon_id: &str) -> StoreResult<Entity> {
        self.entity(dragon_id)
            .filter(|e| self.world.get::<Dragon>(*e).is_some())
            .ok_or_else(|| StoreError::UnknownDragon(dragon_id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<EntityView> {
        if let Some(entity) = self.entity(id) {
            let entity = self.world.get_entity(entity)?;
            return AgentView::read(entity)
                .map(EntityView::Agent)
                .or_else(|| DragonView::read(entity).map(EntityView::Dragon));
        }
        self.structures().get(id).cloned().map(EntityView::Structure)
    }

    pub fn get_all(&self, kind: EntityKind) -> Vec<EntityView> {
        match kind {
            EntityKind::Agent => self.agents().into_iter().map(EntityView::Agent).collect(),
            EntityKind::Dragon => self.dragons().into_iter().map(EntityView::Dragon).collect(),
            EntityKind::Structure => self
                .structures()
                .all()
                .cloned()
                .map(EntityView::Structure)
                .collect(),
        }
    }

    pub fn agent(&self, agent_id: &str) -> Option<AgentView> {
        let entity = self.agent_entity(agent_id).ok()?;
        AgentView::read(self.world.get_entity(entity)?)
    }

    pub fn dragon(&self, dragon_id: &str) -> Option<DragonView> {
        let entity = self.dragon_entity(dragon_id).ok()?;
        DragonView::read(self.world.get_entity(entity)?)
    }

    /// All agents, ordered by id
    pub fn agents(&self) -> Vec<AgentView> {
        let index = self.world.resource::<EntityIndex>();
        index
            .sorted_ids()
            .iter()
            .filter_map(|id| index.get(id))
            .filter_map(|e| self.world.get_entity(e))
            .filter_map(AgentView::read)
            .collect()
    }

    /// All dragons, ordered by id
    pub fn dragons(&self) -> Vec<DragonView> {
        let index = self.world.resource::<EntityIndex>();
        index
            .sorted_ids()
            .iter()
            .filter_map(|id| index.get(id))
            .filter_map(|e| self.world.get_entity(e))
            .filter_map(DragonView::read)
            .collect()
    }

    pub fn agent_count(&self) -> usize {
        self.world
            .iter_entities()
            .filter(|e| e.contains::<Agent>())
            .count()
    }

    pub fn update_agent(&mut self, agent_id: &str, patch: AgentPatch) -> StoreResult<()> {
        let entity = self.agent_entity(agent_id)?;
        if let Some(position) = patch.position {
            ensure_finite(agent_id, position)?;
        }
        if let Some(Some(target)) = patch.target {
            ensure_finite(agent_id, target)?;
        }
        for value in [patch.health, patch.max_health].into_iter().flatten() {
            ensure_finite_health(agent_id, value)?;
        }

        let now = self.now();
        let mut state_change = None;
        {
            let mut agent = self.world.entity_mut(entity);
            if let (Some(name), Some(mut display)) = (patch.name, agent.get_mut::<DisplayName>()) {
                display.0 = name;
            }
            if let (Some(position), Some(mut current)) = (patch.position, agent.get_mut::<Position>()) {
                current.0 = position;
            }
            if let Some(target) = patch.target {
                if let Some(mut current) = agent.get_mut::<MoveTarget>() {
                    current.0 = target;
                }
                if let Some(mut last_move) = agent.get_mut::<LastMove>() {
                    last_move.0 = None;
                }
            }
            if let (Some(state), Some(mut behavior)) = (patch.state, agent.get_mut::<Behavior>()) {
                if behavior.kind != state {
                    state_change = Some((behavior.kind, state));
                    *behavior = Behavior::entered(state, now);
                } else if behavior.entered_at.is_none() {
                    behavior.entered_at = Some(now);
                }
            }
            if let Some(mut health) = agent.get_mut::<Health>() {
                if let Some(max) = patch.max_health {
                    health.max = max.max(0.0);
                }
                if let Some(current) = patch.health {
                    health.current = current.clamp(0.0, health.max);
                }
            }
            if let Some(mut task) = agent.get_mut::<Task>() {
                if let Some(label) = patch.task {
                    task.label = label;
                }
                if let Some(queued) = patch.queued_task {
                    task.queued = queued;
                }
            }
            if let (Some(level), Some(mut current)) = (patch.level, agent.get_mut::<Level>()) {
                current.0 = level;
            }
        }

        if let Some((from, to)) = state_change {
            tracing::debug!("{}: {} -> {}", agent_id, from, to);
            self.record(EventKind::StateChanged {
                agent_id: agent_id.to_string(),
                from,
                to,
            });
        }
        Ok(())
    }

    pub fn update_dragon(&mut self, dragon_id: &str, patch: DragonPatch) -> StoreResult<()> {
        let entity = self.dragon_entity(dragon_id)?;
        if let Some(position) = patch.position {
            ensure_finite(dragon_id, position)?;
        }
        if let Some(Some(agent_id)) = &patch.target {
            self.agent_entity(agent_id)?;
        }
        if let Some(value) = patch.health {
            ensure_finite_health(dragon_id, value)?;
        }

        let mut dragon = self.world.entity_mut(entity);
        if let (Some(name), Some(mut display)) = (patch.name, dragon.get_mut::<DisplayName>()) {
            display.0 = name;
        }
        if let (Some(position), Some(mut current)) = (patch.position, dragon.get_mut::<Position>()) {
            current.0 = position;
        }
        if let (Some(target), Some(mut current)) = (patch.target, dragon.get_mut::<DragonTarget>()) {
            current.0 = target;
        }
        if let (Some(value), Some(mut health)) = (patch.health, dragon.get_mut::<Health>()) {
            health.current = value.clamp(0.0, health.max);
        }
        Ok(())
    }

    /// Teleport an agent, dragon, or structure
    pub fn set_position(&mut self, id: &str, position: Vec3) -> StoreResult<()> {
        ensure_finite(id, position)?;
        if let Some(entity) = self.entity(id) {
            if let Some(mut current) = self.world.get_mut::<Position>(entity) {
                current.0 = position;
                return Ok(());
            }
        }
        match self.world.resource_mut::<StructureRegistry>().get_mut(id) {
            Some(structure) => {
                structure.position = position;
                Ok(())
            }
            None => Err(StoreError::UnknownEntity(id.to_string())),
        }
    }

    /// Remove an agent, dragon, or structure.
    ///
    /// Removing an agent also detaches it from its party, from quests, and
    /// from any dragon hunting it.
    pub fn remove(&mut self, id: &str) -> StoreResult<()> {
        if let Some(entity) = self.entity(id) {
            if self.world.get::<Agent>(entity).is_some() {
                self.remove_agent(id, entity);
            } else {
                self.world.resource_mut::<EntityIndex>().remove(id);
                self.world.despawn(entity);
                tracing::info!("Removed dragon {}", id);
            }
            return Ok(());
        }
        match self.world.resource_mut::<StructureRegistry>().remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::UnknownEntity(id.to_string())),
        }
    }

    fn remove_agent(&mut self, agent_id: &str, entity: Entity) {
        let party_id = self.parties().party_of(agent_id).map(|p| p.id.clone());
        if let Some(party_id) = party_id {
            self.detach_from_party(&party_id, agent_id);
        }

        let mut hunters = self.world.query::<&mut DragonTarget>();
        for mut target in hunters.iter_mut(&mut self.world) {
            if target.0.as_deref() == Some(agent_id) {
                target.0 = None;
            }
        }

        self.world.resource_mut::<QuestBoard>().unassign_agent(agent_id);
        self.world.resource_mut::<ReinforcementCallers>().clear(agent_id);
        self.world.resource_mut::<EntityIndex>().remove(agent_id);
        self.world.despawn(entity);
        self.record(EventKind::AgentDespawned {
            agent_id: agent_id.to_string(),
        });
        tracing::debug!("Despawned {}", agent_id);
    }

    /// Take an agent out of a party, disbanding the party if it empties
    pub(crate) fn detach_from_party(&mut self, party_id: &str, agent_id: &str) {
        let emptied = {
            let mut parties = self.world.resource_mut::<PartyRegistry>();
            match parties.get_mut(party_id) {
                Some(party) => {
                    party.remove_member(agent_id);
                    party.member_ids.is_empty()
                }
                None => false,
            }
        };
        if emptied {
            self.world.resource_mut::<PartyRegistry>().remove(party_id);
            tracing::info!("Party {} disbanded after losing its last member", party_id);
        }
        if let Ok(entity) = self.agent_entity(agent_id) {
            if let Some(mut membership) = self.world.get_mut::<PartyMembership>(entity) {
                membership.0 = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SpawnAgent;

    fn store() -> WorldStore {
        WorldStore::new(Config::default(), 42)
    }

    fn spawn_at(store: &mut WorldStore, x: f32) -> String {
        store
            .spawn_agent(SpawnAgent {
                position: Some(Vec3::new(x, 0.0, 0.0)),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_get_and_get_all() {
        let mut store = store();
        let a = spawn_at(&mut store, 1.0);
        let b = spawn_at(&mut store, 2.0);
        let dragon = store.spawn_dragon(None, Vec3::new(9.0, 0.0, 0.0), None).unwrap();

        assert_eq!(store.get(&a).map(|v| v.kind()), Some(EntityKind::Agent));
        assert_eq!(store.get(&dragon).map(|v| v.kind()), Some(EntityKind::Dragon));
        assert!(store.get("agent_9999").is_none());

        let ids: Vec<String> = store
            .get_all(EntityKind::Agent)
            .iter()
            .map(|v| v.id().to_string())
            .collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(store.get_all(EntityKind::Dragon).len(), 1);
    }

    #[test]
    fn test_update_agent_stamps_state_entry() {
        let mut store = store();
        let id = spawn_at(&mut store, 0.0);
        store.take_events();

        store
            .update_agent(
                &id,
                AgentPatch::default()
                    .with_state(AgentStateKind::Thinking)
                    .with_task("Pondering"),
            )
            .unwrap();

        let agent = store.agent(&id).unwrap();
        assert_eq!(agent.state(), AgentStateKind::Thinking);
        assert_eq!(agent.behavior.entered_at, Some(store.now()));
        assert_eq!(agent.task.label, "Pondering");

        let events = store.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].kind,
            EventKind::StateChanged {
                to: AgentStateKind::Thinking,
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_state_keeps_entry_time() {
        let mut store = store();
        let id = spawn_at(&mut store, 0.0);
        store
            .update_agent(&id, AgentPatch::default().with_state(AgentStateKind::Working))
            .unwrap();
        let entered = store.now();
        for _ in 0..80 {
            store.world_mut().resource_mut::<SimClock>().advance_tick();
        }
        store.take_events();

        store
            .update_agent(&id, AgentPatch::default().with_state(AgentStateKind::Working))
            .unwrap();

        let agent = store.agent(&id).unwrap();
        assert_eq!(agent.behavior.entered_at, Some(entered));
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn test_rejects_non_finite_positions() {
        let mut store = store();
        let id = spawn_at(&mut store, 0.0);

        let err = store
            .update_agent(&id, AgentPatch::default().with_target(Some(Vec3::new(f32::NAN, 0.0, 0.0))))
            .unwrap_err();
        assert!(matches!(err, StoreError::NonFinitePosition { .. }));
        assert!(store
            .set_position(&id, Vec3::new(0.0, f32::INFINITY, 0.0))
            .is_err());
        assert_eq!(store.agent(&id).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut store = store();
        assert_eq!(
            store.update_agent("agent_0404", AgentPatch::default()),
            Err(StoreError::UnknownAgent("agent_0404".to_string()))
        );
        assert!(matches!(
            store.update_dragon("dragon_0404", DragonPatch::default()),
            Err(StoreError::UnknownDragon(_))
        ));
        assert!(matches!(store.remove("nothing"), Err(StoreError::UnknownEntity(_))));
    }

    #[test]
    fn test_health_patch_is_clamped() {
        let mut store = store();
        let id = spawn_at(&mut store, 0.0);
        store
            .update_agent(&id, AgentPatch::default().with_health(250.0))
            .unwrap();
        assert_eq!(store.agent(&id).unwrap().health.current, 100.0);
        store
            .update_agent(&id, AgentPatch::default().with_health(-5.0))
            .unwrap();
        assert_eq!(store.agent(&id).unwrap().health.current, 0.0);
    }

    #[test]
    fn test_rejects_non_finite_health() {
        let mut store = store();
        let id = spawn_at(&mut store, 0.0);
        assert!(matches!(
            store.update_agent(&id, AgentPatch::default().with_health(f32::NAN)),
            Err(StoreError::NonFiniteHealth { .. })
        ));
        let patch = AgentPatch {
            max_health: Some(f32::INFINITY),
            ..Default::default()
        };
        assert!(store.update_agent(&id, patch).is_err());
        assert_eq!(store.agent(&id).unwrap().health.current, 100.0);
        assert_eq!(store.agent(&id).unwrap().health.max, 100.0);

        let dragon = store.spawn_dragon(None, Vec3::ZERO, None).unwrap();
        let patch = DragonPatch {
            health: Some(f32::NAN),
            ..Default::default()
        };
        assert!(matches!(
            store.update_dragon(&dragon, patch),
            Err(StoreError::NonFiniteHealth { .. })
        ));
        assert_eq!(store.dragon(&dragon).unwrap().health.current, 500.0);
    }

    #[test]
    fn test_remove_agent_clears_dragon_target() {
        let mut store = store();
        let id = spawn_at(&mut store, 0.0);
        let dragon = store
            .spawn_dragon(None, Vec3::new(5.0, 0.0, 0.0), Some(id.clone()))
            .unwrap();

        store.remove(&id).unwrap();
        assert!(store.agent(&id).is_none());
        assert_eq!(store.dragon(&dragon).unwrap().target_agent_id, None);

        store.remove(&dragon).unwrap();
        assert!(store.dragons().is_empty());
    }

    #[test]
    fn test_dragon_target_must_exist() {
        let mut store = store();
        let dragon = store.spawn_dragon(None, Vec3::ZERO, None).unwrap();
        let patch = DragonPatch {
            target: Some(Some("agent_0404".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            store.update_dragon(&dragon, patch),
            Err(StoreError::UnknownAgent(_))
        ));
    }
}
