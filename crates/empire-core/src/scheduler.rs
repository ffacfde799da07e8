//! Fixed-rate tick scheduling
//!
//! Turns variable frame deltas into a bounded number of fixed-size ticks.

use std::time::Duration;

use crate::config::SimulationConfig;

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub ticks: u32,
    /// Accumulated time left over for the next frame
    pub carried: Duration,
    /// The frame delta exceeded the clamp
    pub clamped: bool,
}

/// Accumulator-based fixed-step scheduler.
///
/// Each frame's delta is clamped, then whole tick intervals are consumed from
/// the accumulator up to the per-frame cap. The remainder carries over, so
/// under sustained overload simulated time falls behind wall-clock time.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    tick_interval: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl TickScheduler {
    pub fn new(tick_interval: Duration, max_frame_delta: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            tick_interval,
            max_frame_delta,
            max_ticks_per_frame,
            accumulator: Duration::ZERO,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.tick_interval(),
            config.max_frame_delta(),
            config.max_ticks_per_frame,
        )
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Account for a frame and return how many ticks are due
    pub fn advance(&mut self, frame_delta: Duration) -> FrameReport {
        let clamped = frame_delta > self.max_frame_delta;
        if clamped {
            tracing::debug!(
                "Frame delta {:?} clamped to {:?}",
                frame_delta,
                self.max_frame_delta
            );
        }
        self.accumulator += frame_delta.min(self.max_frame_delta);

        let mut ticks = 0;
        while self.accumulator >= self.tick_interval && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.tick_interval;
            ticks += 1;
        }

        FrameReport {
            ticks,
            carried: self.accumulator,
            clamped,
        }
    }

    /// Advance by a frame and invoke `tick` once per due tick
    pub fn run_frame(&mut self, frame_delta: Duration, mut tick: impl FnMut()) -> FrameReport {
        let report = self.advance(frame_delta);
        for _ in 0..report.ticks {
            tick();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> TickScheduler {
        TickScheduler::new(Duration::from_millis(33), Duration::from_millis(100), 3)
    }

    #[test]
    fn test_stall_is_clamped_to_three_ticks() {
        let mut scheduler = scheduler();
        let mut ran = 0;
        let report = scheduler.run_frame(Duration::from_secs(5), || ran += 1);

        assert_eq!(ran, 3);
        assert!(report.clamped);
        assert_eq!(report.carried, Duration::from_millis(1));
    }

    #[test]
    fn test_remainder_carries_into_next_frame() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.advance(Duration::from_millis(20)).ticks, 0);
        let report = scheduler.advance(Duration::from_millis(20));
        assert_eq!(report.ticks, 1);
        assert_eq!(report.carried, Duration::from_millis(7));
    }

    #[test]
    fn test_sustained_overload_falls_behind() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(50), Duration::from_millis(100), 1);
        for frame in 1..=10u32 {
            let report = scheduler.advance(Duration::from_millis(100));
            assert_eq!(report.ticks, 1);
            assert_eq!(report.carried, Duration::from_millis(50) * frame);
        }
    }

    #[test]
    fn test_default_rate_runs_thirty_ticks_per_second() {
        let mut scheduler = TickScheduler::from_config(&SimulationConfig::default());
        let ticks: u32 = (0..60)
            .map(|_| scheduler.advance(Duration::from_nanos(16_666_667)).ticks)
            .sum();
        assert_eq!(ticks, 30);
    }
}
