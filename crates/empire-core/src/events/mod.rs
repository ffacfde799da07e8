//! Event recording
//!
//! Systems and commands push [`EventKind`]s into [`TickEvents`]; the last pass
//! of every tick moves them into the [`EventLog`] and the JSONL logger.

pub mod logger;

use bevy_ecs::prelude::*;
use empire_events::{generate_event_id, EventKind, SimEvent};

use crate::components::world::SimClock;

pub use logger::EventLogger;

/// Resource: events produced since the last drain
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    events: Vec<SimEvent>,
    issued: u64,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp an event with the current tick and time and queue it
    pub fn record(&mut self, clock: &SimClock, kind: EventKind) {
        self.issued += 1;
        self.events.push(SimEvent::new(
            generate_event_id(self.issued),
            clock.current_tick,
            clock.now,
            kind,
        ));
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events ever recorded
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Resource: drained events waiting to be collected by the driver
#[derive(Resource, Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn extend(&mut self, events: impl IntoIterator<Item = SimEvent>) {
        self.events.extend(events);
    }

    pub fn take(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }
}

/// Record an event from code holding the whole world (commands, exclusive systems)
pub fn record_event(world: &mut World, kind: EventKind) {
    let clock = world.resource::<SimClock>().clone();
    world.resource_mut::<TickEvents>().record(&clock, kind);
}

/// Final pass of a tick: move queued events into the log and the JSONL file
pub fn drain_tick_events(
    mut tick_events: ResMut<TickEvents>,
    mut log: ResMut<EventLog>,
    logger: Option<ResMut<EventLogger>>,
) {
    if tick_events.is_empty() {
        return;
    }
    let events = tick_events.drain();
    if let Some(mut logger) = logger {
        if let Err(e) = logger.log_batch(&events) {
            tracing::warn!("Failed to write {} events: {}", events.len(), e);
        }
    }
    log.extend(events);
}
