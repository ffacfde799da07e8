//! Simulation driver
//!
//! Couples the [`WorldStore`] with the per-tick schedule and the fixed-rate
//! [`TickScheduler`].

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use std::time::Duration;

use empire_events::SimEvent;

use crate::config::Config;
use crate::events::drain_tick_events;
use crate::scheduler::{FrameReport, TickScheduler};
use crate::store::WorldStore;
use crate::systems::{
    advance_clock, dispatch_reinforcements, move_agents, update_agent_states, update_dragons,
};

/// Build the per-tick schedule.
///
/// Passes run strictly in order on one thread: clock, movement for every
/// agent, state machine for every agent, queued reinforcement calls, dragon
/// AI, then event collection.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            advance_clock,
            move_agents,
            update_agent_states,
            dispatch_reinforcements,
            update_dragons,
            drain_tick_events,
        )
            .chain(),
    );
    schedule
}

pub struct Simulation {
    store: WorldStore,
    schedule: Schedule,
    scheduler: TickScheduler,
}

impl Simulation {
    pub fn new(config: Config, seed: u64) -> Self {
        Self::from_store(WorldStore::new(config, seed))
    }

    /// Drive an existing store, taking tick timing from its config
    pub fn from_store(store: WorldStore) -> Self {
        let scheduler = TickScheduler::from_config(&store.config().simulation);
        Self {
            store,
            schedule: build_schedule(),
            scheduler,
        }
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut WorldStore {
        &mut self.store
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Run exactly one tick regardless of elapsed time
    pub fn tick(&mut self) {
        self.schedule.run(self.store.world_mut());
    }

    /// Account for one rendered frame and run the ticks it owes
    pub fn advance_frame(&mut self, frame_delta: Duration) -> FrameReport {
        let Self {
            store,
            schedule,
            scheduler,
        } = self;
        scheduler.run_frame(frame_delta, || schedule.run(store.world_mut()))
    }

    pub fn take_events(&mut self) -> Vec<SimEvent> {
        self.store.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_advances_clock() {
        let mut sim = Simulation::new(Config::default(), 0);
        sim.tick();
        sim.tick();
        assert_eq!(sim.store().clock().current_tick, 2);
        assert_eq!(
            sim.store().now().as_duration(),
            Config::default().simulation.tick_interval() * 2
        );
    }

    #[test]
    fn test_frame_runs_due_ticks() {
        let mut sim = Simulation::new(Config::default(), 0);
        let report = sim.advance_frame(Duration::from_millis(70));
        assert_eq!(report.ticks, 2);
        assert_eq!(sim.store().clock().current_tick, 2);

        let report = sim.advance_frame(Duration::from_secs(10));
        assert!(report.clamped);
        assert_eq!(report.ticks, 3);
        assert_eq!(sim.store().clock().current_tick, 5);
    }

    #[test]
    fn test_draining_each_frame_keeps_log_empty() {
        use crate::commands::SpawnAgent;
        use crate::events::{EventLog, TickEvents};
        use glam::Vec3;

        let mut sim = Simulation::new(Config::default(), 0);
        let ids: Vec<String> = (0..3)
            .map(|i| {
                sim.store_mut()
                    .spawn_agent(SpawnAgent {
                        position: Some(Vec3::new(i as f32, 0.0, 0.0)),
                        ..Default::default()
                    })
                    .unwrap()
            })
            .collect();
        sim.store_mut()
            .move_agents_to(&ids, Vec3::new(4.0, 0.0, 0.0))
            .unwrap();

        let mut seen = 0;
        for _ in 0..120 {
            sim.advance_frame(Duration::from_millis(16));
            seen += sim.take_events().len();
            assert!(sim.store().world().resource::<EventLog>().events().is_empty());
        }

        let issued = sim.store().world().resource::<TickEvents>().issued();
        assert!(seen > 0);
        assert_eq!(seen as u64, issued);
    }
}
