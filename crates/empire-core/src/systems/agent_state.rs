//! Agent State System
//!
//! Timed transitions between behavioral states, plus the low-health
//! reinforcement trigger for agents in combat.

use bevy_ecs::prelude::*;

use empire_events::{AgentStateKind, EventKind, SimTime};

use crate::components::agent::{Agent, AgentId, Behavior, Health, Task};
use crate::components::dragon::{Dragon, DragonId};
use crate::components::world::{Position, SimClock};
use crate::config::{Config, StateConfig};
use crate::events::TickEvents;
use crate::systems::reinforcement::{ReinforcementCallers, ReinforcementRequest, ReinforcementRequests};

/// What the state machine does with an agent this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStep {
    /// Nothing changes
    Stay,
    /// The state has no entry time yet; stamp it with the current time
    Stamp,
    /// Enter a new state now
    Transition(AgentStateKind),
}

/// Pure transition function over (state, time in state)
pub fn evaluate(behavior: &Behavior, now: SimTime, config: &StateConfig) -> StateStep {
    let Some(elapsed) = behavior.elapsed(now) else {
        return StateStep::Stamp;
    };

    let (limit, next) = match behavior.kind {
        AgentStateKind::Thinking => (config.thinking(), AgentStateKind::Idle),
        AgentStateKind::Working => (config.working(), AgentStateKind::Completing),
        AgentStateKind::Completing => (config.completing(), AgentStateKind::Idle),
        _ => return StateStep::Stay,
    };

    if elapsed >= limit {
        StateStep::Transition(next)
    } else {
        StateStep::Stay
    }
}

/// Apply timed transitions and raise reinforcement requests
#[allow(clippy::too_many_arguments)]
pub fn update_agent_states(
    clock: Res<SimClock>,
    config: Res<Config>,
    mut events: ResMut<TickEvents>,
    mut callers: ResMut<ReinforcementCallers>,
    mut requests: ResMut<ReinforcementRequests>,
    mut agents: Query<(&AgentId, &Position, &Health, &mut Behavior, &mut Task), With<Agent>>,
    dragons: Query<(&DragonId, &Position), (With<Dragon>, Without<Agent>)>,
) {
    let combat = &config.combat;

    for (agent_id, position, health, mut behavior, mut task) in agents.iter_mut() {
        match evaluate(&behavior, clock.now, &config.states) {
            StateStep::Stay => {}
            StateStep::Stamp => behavior.entered_at = Some(clock.now),
            StateStep::Transition(next) => {
                let previous = behavior.kind;
                *behavior = Behavior::entered(next, clock.now);
                if previous == AgentStateKind::Completing && next == AgentStateKind::Idle {
                    task.label = config.states.idle_task_label.clone();
                }
                tracing::debug!("{}: {} -> {}", agent_id.0, previous, next);
                events.record(
                    &clock,
                    EventKind::StateChanged {
                        agent_id: agent_id.0.clone(),
                        from: previous,
                        to: next,
                    },
                );
            }
        }

        if !behavior.is(AgentStateKind::Combat) {
            callers.clear(&agent_id.0);
            continue;
        }
        if health.ratio() >= combat.reinforcement_health_ratio || callers.has_called(&agent_id.0) {
            continue;
        }

        // One call per combat engagement, whether or not a dragon is found
        callers.mark(&agent_id.0);
        let nearest = dragons
            .iter()
            .map(|(dragon_id, dragon_pos)| (position.0.distance(dragon_pos.0), dragon_id))
            .filter(|(distance, _)| *distance < combat.dragon_search_radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1 .0.cmp(&b.1 .0)));

        match nearest {
            Some((_, dragon_id)) => {
                tracing::info!(
                    "{} at {:.0}% health calls for reinforcements against {}",
                    agent_id.0,
                    health.ratio() * 100.0,
                    dragon_id.0
                );
                requests.push(ReinforcementRequest {
                    agent_id: agent_id.0.clone(),
                    dragon_id: dragon_id.0.clone(),
                    max_count: combat.max_reinforcements,
                });
            }
            None => tracing::debug!("{} is losing but no dragon is nearby", agent_id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> StateConfig {
        StateConfig::default()
    }

    #[test]
    fn test_thinking_needs_full_duration() {
        let b = Behavior::entered(AgentStateKind::Thinking, SimTime::from_millis(1000));
        assert_eq!(evaluate(&b, SimTime::from_millis(2999), &config()), StateStep::Stay);
        assert_eq!(
            evaluate(&b, SimTime::from_millis(3000), &config()),
            StateStep::Transition(AgentStateKind::Idle)
        );
    }

    #[test]
    fn test_work_cycle() {
        let working = Behavior::entered(AgentStateKind::Working, SimTime::ZERO);
        assert_eq!(
            evaluate(&working, SimTime::from_millis(3000), &config()),
            StateStep::Transition(AgentStateKind::Completing)
        );

        let completing = Behavior::entered(AgentStateKind::Completing, SimTime::ZERO);
        assert_eq!(evaluate(&completing, SimTime::from_millis(1499), &config()), StateStep::Stay);
        assert_eq!(
            evaluate(&completing, SimTime::from_millis(1500), &config()),
            StateStep::Transition(AgentStateKind::Idle)
        );
    }

    #[test]
    fn test_untimed_states_stay() {
        for kind in [
            AgentStateKind::Idle,
            AgentStateKind::Moving,
            AgentStateKind::Combat,
            AgentStateKind::Error,
        ] {
            let b = Behavior::entered(kind, SimTime::ZERO);
            assert_eq!(evaluate(&b, SimTime::from_millis(3_600_000), &config()), StateStep::Stay);
        }
    }

    #[test]
    fn test_unstamped_state_is_stamped() {
        let b = Behavior::new(AgentStateKind::Working);
        assert_eq!(evaluate(&b, SimTime::from_millis(10), &config()), StateStep::Stamp);
    }

    fn world_with_agent(kind: AgentStateKind, health: f32) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(Config::default());
        world.insert_resource(SimClock::new(Duration::from_millis(100)));
        world.insert_resource(TickEvents::new());
        world.insert_resource(ReinforcementCallers::default());
        world.insert_resource(ReinforcementRequests::default());
        let entity = world
            .spawn((
                Agent,
                AgentId("agent_0001".to_string()),
                Position::new(0.0, 0.0, 0.0),
                Health {
                    current: health,
                    max: 100.0,
                },
                Behavior::entered(kind, SimTime::ZERO),
                Task::new("Working"),
            ))
            .id();
        (world, entity)
    }

    fn spawn_dragon(world: &mut World, id: &str, x: f32) {
        world.spawn((Dragon, DragonId(id.to_string()), Position::new(x, 0.0, 0.0)));
    }

    fn run(world: &mut World, ticks: usize) {
        let mut schedule = Schedule::default();
        schedule.add_systems((crate::systems::advance_clock, update_agent_states).chain());
        for _ in 0..ticks {
            schedule.run(world);
        }
    }

    #[test]
    fn test_completing_resets_label() {
        let (mut world, entity) = world_with_agent(AgentStateKind::Completing, 100.0);
        run(&mut world, 15);

        assert_eq!(world.get::<Behavior>(entity).unwrap().kind, AgentStateKind::Idle);
        assert_eq!(world.get::<Task>(entity).unwrap().label, "Awaiting orders...");
    }

    #[test]
    fn test_low_health_requests_once() {
        let (mut world, _) = world_with_agent(AgentStateKind::Combat, 30.0);
        spawn_dragon(&mut world, "dragon_0002", 6.0);
        spawn_dragon(&mut world, "dragon_0001", 4.0);
        run(&mut world, 10);

        let requests = world.resource_mut::<ReinforcementRequests>().drain();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].dragon_id, "dragon_0001");
        assert_eq!(requests[0].max_count, 20);
    }

    #[test]
    fn test_no_request_when_dragon_far_or_health_ok() {
        let (mut world, _) = world_with_agent(AgentStateKind::Combat, 30.0);
        spawn_dragon(&mut world, "dragon_0001", 10.0);
        run(&mut world, 3);
        assert!(world.resource::<ReinforcementRequests>().is_empty());
        assert!(world.resource::<ReinforcementCallers>().has_called("agent_0001"));

        let (mut world, _) = world_with_agent(AgentStateKind::Combat, 40.0);
        spawn_dragon(&mut world, "dragon_0001", 1.0);
        run(&mut world, 3);
        assert!(world.resource::<ReinforcementRequests>().is_empty());
    }

    #[test]
    fn test_leaving_combat_clears_flag() {
        let (mut world, entity) = world_with_agent(AgentStateKind::Combat, 30.0);
        spawn_dragon(&mut world, "dragon_0001", 1.0);
        run(&mut world, 1);
        assert_eq!(world.resource_mut::<ReinforcementRequests>().drain().len(), 1);

        *world.get_mut::<Behavior>(entity).unwrap() = Behavior::new(AgentStateKind::Idle);
        run(&mut world, 1);
        assert!(!world.resource::<ReinforcementCallers>().has_called("agent_0001"));

        *world.get_mut::<Behavior>(entity).unwrap() = Behavior::new(AgentStateKind::Combat);
        run(&mut world, 1);
        assert_eq!(world.resource_mut::<ReinforcementRequests>().drain().len(), 1);
    }
}
