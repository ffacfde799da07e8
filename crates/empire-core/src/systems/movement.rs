//! Movement System
//!
//! Moves agents with a pending target toward it at constant speed.

use bevy_ecs::prelude::*;
use glam::Vec3;

use empire_events::{AgentStateKind, EventKind};

use crate::components::agent::{Agent, AgentId, Behavior, LastMove, MoveTarget, Task};
use crate::components::world::{Position, SimClock};
use crate::config::Config;
use crate::events::TickEvents;

/// Outcome of one movement step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub position: Vec3,
    pub arrived: bool,
}

/// Advance `current` toward `target` by `speed * elapsed_secs`, never past it.
///
/// Within `epsilon` of the target the position snaps onto it exactly.
pub fn step_towards(current: Vec3, target: Vec3, speed: f32, elapsed_secs: f32, epsilon: f32) -> Step {
    let offset = target - current;
    let remaining = offset.length();
    if remaining < epsilon {
        return Step {
            position: target,
            arrived: true,
        };
    }

    let travel = (speed * elapsed_secs).clamp(0.0, remaining);
    let position = current + offset / remaining * travel;
    if position.distance(target) < epsilon {
        Step {
            position: target,
            arrived: true,
        }
    } else {
        Step {
            position,
            arrived: false,
        }
    }
}

/// State an agent settles into after reaching its destination.
///
/// COMBAT and ERROR are kept; otherwise a queued task starts work.
fn arrival_state(current: AgentStateKind, task: &Task) -> Option<AgentStateKind> {
    match current {
        AgentStateKind::Combat | AgentStateKind::Error => None,
        _ if task.has_queued() => Some(AgentStateKind::Working),
        _ => Some(AgentStateKind::Idle),
    }
}

/// Step every travelling agent, then settle the ones that arrived
pub fn move_agents(
    clock: Res<SimClock>,
    config: Res<Config>,
    mut events: ResMut<TickEvents>,
    mut agents: Query<
        (
            &AgentId,
            &mut Position,
            &mut MoveTarget,
            &mut LastMove,
            &mut Behavior,
            &mut Task,
        ),
        With<Agent>,
    >,
) {
    let movement = &config.movement;

    for (agent_id, mut position, mut target, mut last_move, mut behavior, mut task) in agents.iter_mut() {
        let Some(destination) = target.0 else {
            continue;
        };

        let elapsed = last_move
            .0
            .map_or(clock.tick_interval, |at| clock.now.since(at));
        let step = step_towards(
            position.0,
            destination,
            movement.speed,
            elapsed.as_secs_f32(),
            movement.arrival_epsilon,
        );
        position.0 = step.position;

        if !step.arrived {
            last_move.0 = Some(clock.now);
            continue;
        }

        target.0 = None;
        last_move.0 = None;
        events.record(
            &clock,
            EventKind::AgentArrived {
                agent_id: agent_id.0.clone(),
                position: position.0.to_array(),
            },
        );

        let Some(next) = arrival_state(behavior.kind, &task) else {
            continue;
        };
        if let Some(queued) = task.queued.take() {
            task.label = queued;
        }
        let previous = behavior.kind;
        *behavior = Behavior::entered(next, clock.now);
        if previous != next {
            tracing::debug!("{} arrived: {} -> {}", agent_id.0, previous, next);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::Health;
    use std::time::Duration;

    #[test]
    fn test_step_never_overshoots() {
        let step = step_towards(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 5.0, 10.0, 0.1);
        assert!(step.arrived);
        assert_eq!(step.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_step_partial_progress() {
        let step = step_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 5.0, 0.5, 0.1);
        assert!(!step.arrived);
        assert!((step.position.x - 2.5).abs() < 1e-5);
        assert_eq!(step.position.y, 0.0);
    }

    #[test]
    fn test_step_snaps_within_epsilon() {
        let target = Vec3::new(3.0, 0.0, 4.0);
        let step = step_towards(Vec3::new(3.0, 0.0, 3.95), target, 5.0, 0.0, 0.1);
        assert!(step.arrived);
        assert_eq!(step.position, target);
    }

    #[test]
    fn test_step_ignores_negative_elapsed() {
        let step = step_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 5.0, -3.0, 0.1);
        assert_eq!(step.position, Vec3::ZERO);
        assert!(!step.arrived);
    }

    fn setup(task: Task, kind: AgentStateKind) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(Config::default());
        world.insert_resource(SimClock::new(Duration::from_millis(100)));
        world.insert_resource(TickEvents::new());
        let entity = world
            .spawn((
                Agent,
                AgentId("agent_0001".to_string()),
                Position::new(0.0, 0.0, 0.0),
                MoveTarget(Some(Vec3::new(1.0, 0.0, 0.0))),
                LastMove::default(),
                Behavior::entered(kind, empire_events::SimTime::ZERO),
                task,
                Health::full(100.0),
            ))
            .id();
        (world, entity)
    }

    fn run_ticks(world: &mut World, ticks: usize) {
        let mut schedule = Schedule::default();
        schedule.add_systems((crate::systems::advance_clock, move_agents).chain());
        for _ in 0..ticks {
            schedule.run(world);
        }
    }

    #[test]
    fn test_arrival_without_queued_task_goes_idle() {
        let (mut world, entity) = setup(Task::new("Moving to 1, 0..."), AgentStateKind::Moving);
        // 5 u/s over 100 ms ticks covers 1 unit in 2 ticks
        run_ticks(&mut world, 2);

        assert_eq!(world.get::<Position>(entity).unwrap().0, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(world.get::<MoveTarget>(entity).unwrap().0, None);
        assert_eq!(world.get::<Behavior>(entity).unwrap().kind, AgentStateKind::Idle);
        assert_eq!(world.resource::<TickEvents>().len(), 2);
    }

    #[test]
    fn test_arrival_with_queued_task_starts_work() {
        let task = Task::new("Moving to 1, 0...").with_queued("Assigned to Workshop");
        let (mut world, entity) = setup(task, AgentStateKind::Moving);
        run_ticks(&mut world, 2);

        let behavior = world.get::<Behavior>(entity).unwrap();
        assert_eq!(behavior.kind, AgentStateKind::Working);
        assert!(behavior.entered_at.is_some());
        let task = world.get::<Task>(entity).unwrap();
        assert_eq!(task.label, "Assigned to Workshop");
        assert!(!task.has_queued());
    }

    #[test]
    fn test_combat_state_survives_arrival() {
        let (mut world, entity) = setup(Task::new("Reinforcing"), AgentStateKind::Combat);
        run_ticks(&mut world, 3);

        assert_eq!(world.get::<MoveTarget>(entity).unwrap().0, None);
        assert_eq!(world.get::<Behavior>(entity).unwrap().kind, AgentStateKind::Combat);
    }
}
