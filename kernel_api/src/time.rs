//! Simulated time
//!
//! The simulator's clock counts ticks. An [`Instant`] is a reading of that
//! clock; a [`Duration`] is a distance between two readings.

use core::ops::Add;
use serde::{Deserialize, Serialize};

/// A reading of the simulation clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instant {
    ticks: u64,
}

impl Instant {
    /// The instant the simulation starts at
    pub const ZERO: Instant = Instant { ticks: 0 };

    pub const fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    pub const fn as_ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the time elapsed since `earlier`, zero if `earlier` is later
    pub fn saturating_since(&self, earlier: Instant) -> Duration {
        Duration::from_ticks(self.ticks.saturating_sub(earlier.ticks))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Self::Output {
        Instant::from_ticks(self.ticks.saturating_add(duration.as_ticks()))
    }
}

/// A span of simulated ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration {
    ticks: u64,
}

impl Duration {
    pub const fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    pub const fn as_ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_advances_by_duration() {
        let start = Instant::ZERO;
        let later = start + Duration::from_ticks(25);
        assert_eq!(later.as_ticks(), 25);
        assert!(later > start);
    }

    #[test]
    fn test_saturating_since() {
        let a = Instant::from_ticks(10);
        let b = Instant::from_ticks(40);
        assert_eq!(b.saturating_since(a), Duration::from_ticks(30));
        assert_eq!(a.saturating_since(b), Duration::from_ticks(0));
    }

    #[test]
    fn test_add_saturates() {
        let end = Instant::from_ticks(u64::MAX) + Duration::from_ticks(1);
        assert_eq!(end.as_ticks(), u64::MAX);
    }
}
