//! Output Generation
//!
//! HUD statistics and world snapshots.

pub mod snapshot;
pub mod stats;

pub use snapshot::*;
pub use stats::*;
