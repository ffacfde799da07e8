//! Reinforcement System
//!
//! Agents losing a fight pull nearby idle allies into combat. Requests are
//! raised by the state pass and served by an exclusive system, since joining
//! agents are mutated while other agents are being read.

use bevy_ecs::prelude::*;
use std::collections::HashSet;

use empire_events::{AgentStateKind, EventKind};

use crate::components::agent::{Agent, AgentId, Behavior, Health, LastMove, MoveTarget, Task};
use crate::components::dragon::Dragon;
use crate::components::world::{DisplayName, EntityIndex, Position, SimClock};
use crate::config::Config;
use crate::events::record_event;

/// Resource: agents that already called for help in their current fight
#[derive(Resource, Debug, Default)]
pub struct ReinforcementCallers {
    called: HashSet<String>,
}

impl ReinforcementCallers {
    pub fn has_called(&self, agent_id: &str) -> bool {
        self.called.contains(agent_id)
    }

    pub fn mark(&mut self, agent_id: &str) {
        self.called.insert(agent_id.to_string());
    }

    pub fn clear(&mut self, agent_id: &str) {
        self.called.remove(agent_id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinforcementRequest {
    pub agent_id: String,
    pub dragon_id: String,
    pub max_count: usize,
}

/// Resource: queue of reinforcement calls raised this tick
#[derive(Resource, Debug, Default)]
pub struct ReinforcementRequests {
    requests: Vec<ReinforcementRequest>,
}

impl ReinforcementRequests {
    pub fn push(&mut self, request: ReinforcementRequest) {
        self.requests.push(request);
    }

    pub fn drain(&mut self) -> Vec<ReinforcementRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn agent_entity(world: &World, agent_id: &str) -> Option<Entity> {
    let entity = world.resource::<EntityIndex>().get(agent_id)?;
    world.get::<Agent>(entity).map(|_| entity)
}

/// Pull up to `max_count` idle, healthy agents near the caller into the
/// fight against `dragon_id`. Returns the ids of the agents that joined.
///
/// An unknown caller or dragon yields no reinforcements.
pub fn call_for_reinforcements(
    world: &mut World,
    agent_id: &str,
    dragon_id: &str,
    max_count: usize,
) -> Vec<String> {
    let Some(caller) = agent_entity(world, agent_id) else {
        return Vec::new();
    };
    let Some(dragon_pos) = world
        .resource::<EntityIndex>()
        .get(dragon_id)
        .filter(|entity| world.get::<Dragon>(*entity).is_some())
        .and_then(|entity| world.get::<Position>(entity))
        .map(|p| p.0)
    else {
        return Vec::new();
    };
    let Some(caller_pos) = world.get::<Position>(caller).map(|p| p.0) else {
        return Vec::new();
    };
    let caller_name = world
        .get::<DisplayName>(caller)
        .map_or_else(|| agent_id.to_string(), |n| n.0.clone());
    let recruit_radius = world.resource::<Config>().combat.recruit_radius;

    let mut candidates: Vec<(f32, String, Entity)> = world
        .query_filtered::<(Entity, &AgentId, &Position, &Behavior, &Health), With<Agent>>()
        .iter(world)
        .filter(|(entity, _, _, behavior, health)| {
            *entity != caller && behavior.is(AgentStateKind::Idle) && !health.is_down()
        })
        .map(|(entity, id, pos, _, _)| (caller_pos.distance(pos.0), id.0.clone(), entity))
        .filter(|(distance, _, _)| *distance <= recruit_radius)
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    candidates.truncate(max_count);

    let now = world.resource::<SimClock>().now;
    let mut joined = Vec::with_capacity(candidates.len());
    for (_, id, entity) in candidates {
        {
            let mut ally = world.entity_mut(entity);
            if let Some(mut behavior) = ally.get_mut::<Behavior>() {
                *behavior = Behavior::entered(AgentStateKind::Combat, now);
            }
            if let Some(mut target) = ally.get_mut::<MoveTarget>() {
                target.0 = Some(dragon_pos);
            }
            if let Some(mut last_move) = ally.get_mut::<LastMove>() {
                last_move.0 = None;
            }
            if let Some(mut task) = ally.get_mut::<Task>() {
                task.label = format!("Reinforcing {}", caller_name);
            }
        }
        record_event(
            world,
            EventKind::StateChanged {
                agent_id: id.clone(),
                from: AgentStateKind::Idle,
                to: AgentStateKind::Combat,
            },
        );
        joined.push(id);
    }

    if !joined.is_empty() {
        if let Some(mut task) = world.get_mut::<Task>(caller) {
            task.label = format!("Called {} reinforcements!", joined.len());
        }
    }
    record_event(
        world,
        EventKind::ReinforcementsCalled {
            agent_id: agent_id.to_string(),
            dragon_id: dragon_id.to_string(),
            joined: joined.clone(),
        },
    );
    tracing::info!("{} reinforcements answered {}", joined.len(), agent_id);
    joined
}

/// Serve every reinforcement request raised this tick, in order
pub fn dispatch_reinforcements(world: &mut World) {
    let requests = world.resource_mut::<ReinforcementRequests>().drain();
    for request in requests {
        call_for_reinforcements(world, &request.agent_id, &request.dragon_id, request.max_count);
    }
}
