//! Dragon AI System
//!
//! Dragons creep toward their target agent and bite when in range.

use bevy_ecs::prelude::*;
use rand::Rng;

use empire_events::EventKind;

use crate::components::agent::{Agent, AgentId, Health};
use crate::components::dragon::{Dragon, DragonId, DragonTarget};
use crate::components::world::{EntityIndex, Position, SimClock};
use crate::config::Config;
use crate::events::TickEvents;
use crate::SimRng;

/// Move each hunting dragon one step and attack its target if close enough.
///
/// A dragon whose target no longer exists stays where it is.
#[allow(clippy::too_many_arguments)]
pub fn update_dragons(
    clock: Res<SimClock>,
    config: Res<Config>,
    index: Res<EntityIndex>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<TickEvents>,
    mut dragons: Query<(&DragonId, &mut Position, &DragonTarget), (With<Dragon>, Without<Agent>)>,
    mut agents: Query<(&AgentId, &Position, &mut Health), (With<Agent>, Without<Dragon>)>,
) {
    let tuning = &config.dragons;

    for (dragon_id, mut dragon_pos, target) in dragons.iter_mut() {
        let Some(target_id) = target.0.as_deref() else {
            continue;
        };
        let Some(entity) = index.get(target_id) else {
            continue;
        };
        let Ok((agent_id, agent_pos, mut health)) = agents.get_mut(entity) else {
            continue;
        };

        let direction = (agent_pos.0 - dragon_pos.0).normalize_or_zero();
        dragon_pos.0 += direction * tuning.step_per_tick;

        if dragon_pos.0.distance(agent_pos.0) >= tuning.attack_range || health.is_down() {
            continue;
        }

        let damage = rng.0.gen_range(tuning.damage_min..=tuning.damage_max);
        let remaining = health.apply_damage(damage);
        tracing::debug!("{} bites {} for {} ({} left)", dragon_id.0, agent_id.0, damage, remaining);
        events.record(
            &clock,
            EventKind::AgentDamaged {
                agent_id: agent_id.0.clone(),
                dragon_id: dragon_id.0.clone(),
                damage,
                health: remaining,
            },
        );

        if health.is_down() {
            tracing::info!("{} was downed by {}", agent_id.0, dragon_id.0);
            events.record(
                &clock,
                EventKind::AgentDowned {
                    agent_id: agent_id.0.clone(),
                    dragon_id: dragon_id.0.clone(),
                },
            );
        }
    }
}
