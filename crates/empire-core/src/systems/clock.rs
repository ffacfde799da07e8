//! Clock System
//!
//! First pass of every tick.

use bevy_ecs::prelude::*;

use crate::components::world::SimClock;

/// Advance simulated time by one tick interval
pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.advance_tick();
}
