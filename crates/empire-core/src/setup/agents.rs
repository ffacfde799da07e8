//! Agent Spawning
//!
//! The opening roster around the Command Center and the dragons that hunt it.

use glam::Vec3;
use rand::Rng;

use crate::commands::{circle_points, SpawnAgent, DEFAULT_ROSTER};
use crate::error::StoreResult;
use crate::setup::world::COMMAND_CENTER;
use crate::store::WorldStore;
use crate::SimRng;

/// Radius of the ring the opening agents stand on
const OPENING_RING_RADIUS: f32 = 3.0;

/// Dragons are named after the failure they stand for
const DRAGON_KINDS: &[&str] = &["Syntax", "Runtime", "Network", "Permission", "Unknown"];

/// What [`populate`] spawned
#[derive(Debug, Clone, Default)]
pub struct SpawnSummary {
    pub agent_ids: Vec<String>,
    pub dragon_ids: Vec<String>,
}

/// Spawn `count` agents on a ring around the Command Center, named in roster
/// order.
pub fn spawn_opening_agents(store: &mut WorldStore, count: usize) -> StoreResult<Vec<String>> {
    circle_points(COMMAND_CENTER, count, OPENING_RING_RADIUS)
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            store.spawn_agent(SpawnAgent {
                name: Some(DEFAULT_ROSTER[i % DEFAULT_ROSTER.len()].to_string()),
                position: Some(position),
                parent_id: None,
            })
        })
        .collect()
}

/// Spawn `count` dragons, each two units east of a random agent and hunting
/// it. Does nothing when there are no agents.
pub fn spawn_dragons(store: &mut WorldStore, count: usize) -> StoreResult<Vec<String>> {
    let agents = store.agents();
    if agents.is_empty() {
        if count > 0 {
            tracing::warn!("No agents to hunt; skipping {} dragons", count);
        }
        return Ok(Vec::new());
    }

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let (prey, kind) = {
            let mut rng = store.world_mut().resource_mut::<SimRng>();
            (
                &agents[rng.0.gen_range(0..agents.len())],
                DRAGON_KINDS[rng.0.gen_range(0..DRAGON_KINDS.len())],
            )
        };
        let id = store.spawn_dragon(
            Some(format!("{} Dragon", kind)),
            prey.position + Vec3::new(2.0, 0.0, 0.0),
            Some(prey.id.clone()),
        )?;
        ids.push(id);
    }
    Ok(ids)
}

/// Spawn the opening agents, then the dragons
pub fn populate(store: &mut WorldStore, agents: usize, dragons: usize) -> StoreResult<SpawnSummary> {
    let agent_ids = spawn_opening_agents(store, agents)?;
    let dragon_ids = spawn_dragons(store, dragons)?;
    tracing::info!(
        "Spawned {} agents and {} dragons",
        agent_ids.len(),
        dragon_ids.len()
    );
    Ok(SpawnSummary {
        agent_ids,
        dragon_ids,
    })
}
