//! Simulation Time Types
//!
//! Simulated time advances by exactly one tick interval per tick, independent
//! of wall-clock frame timing. Values serialize as fractional milliseconds.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use empire_events::{GameClock, SimTime};
//!
//! let t = SimTime::from_millis(125_000);
//! assert_eq!(t.as_millis_f64(), 125_000.0);
//! assert_eq!(GameClock::from(t).to_string(), "02:05");
//! assert_eq!(t + Duration::from_millis(500), SimTime::from_millis(125_500));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use std::time::Duration;

/// Point in simulated time, measured from the start of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(Duration);

impl SimTime {
    /// The start of the session.
    pub const ZERO: SimTime = SimTime(Duration::ZERO);

    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0.as_nanos() as f64 / 1_000_000.0
    }

    /// Time elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: SimTime) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl Serialize for SimTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_millis_f64())
    }
}

impl<'de> Deserialize<'de> for SimTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "invalid simulation time: {} ms",
                millis
            )));
        }
        Ok(SimTime(Duration::from_nanos((millis * 1_000_000.0).round() as u64)))
    }
}

/// Elapsed session time shown as `MM:SS`.
///
/// Minutes are not wrapped at the hour; a two-hour session reads `120:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameClock {
    pub minutes: u64,
    pub seconds: u8,
}

impl From<SimTime> for GameClock {
    fn from(time: SimTime) -> Self {
        let total = time.as_duration().as_secs();
        Self {
            minutes: total / 60,
            seconds: (total % 60) as u8,
        }
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Error type for parsing a [`GameClock`] from a string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseClockError {
    InvalidFormat(String),
    InvalidMinutes(String),
    InvalidSeconds(String),
}

impl fmt::Display for ParseClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseClockError::InvalidFormat(s) => {
                write!(f, "invalid clock format: '{}', expected 'MM:SS'", s)
            }
            ParseClockError::InvalidMinutes(s) => write!(f, "invalid minutes: '{}'", s),
            ParseClockError::InvalidSeconds(s) => write!(f, "invalid seconds: '{}'", s),
        }
    }
}

impl std::error::Error for ParseClockError {}

impl FromStr for GameClock {
    type Err = ParseClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minutes, seconds) = s
            .split_once(':')
            .ok_or_else(|| ParseClockError::InvalidFormat(s.to_string()))?;

        let minutes = minutes
            .parse::<u64>()
            .map_err(|_| ParseClockError::InvalidMinutes(minutes.to_string()))?;
        let seconds = seconds
            .parse::<u8>()
            .ok()
            .filter(|secs| *secs < 60)
            .ok_or_else(|| ParseClockError::InvalidSeconds(seconds.to_string()))?;

        Ok(Self { minutes, seconds })
    }
}
