//! # Simulated Clock
//!
//! Deterministic clock for the simulated kernel.
//!
//! Time only moves when a test or the simulation loop advances it, so task
//! creation timestamps are reproducible.

use kernel_api::{Clock, Duration, Instant};

/// Simulated clock with controllable tick progression
///
/// # Examples
///
/// ```
/// use kernel_api::{Clock, Duration};
/// use sim_kernel::timer::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.now().as_ticks(), 0);
///
/// clock.advance(Duration::from_ticks(100));
/// assert_eq!(clock.now().as_ticks(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    now: Instant,
}

impl SimClock {
    /// Creates a clock starting at tick 0
    pub fn new() -> Self {
        Self { now: Instant::ZERO }
    }

    /// Creates a clock starting at a specific tick
    pub fn starting_at(ticks: u64) -> Self {
        Self {
            now: Instant::from_ticks(ticks),
        }
    }

    /// Moves time forward
    pub fn advance(&mut self, duration: Duration) {
        self.now = self.now + duration;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock_starts_at_zero() {
        assert_eq!(SimClock::new().now(), Instant::ZERO);
    }

    #[test]
    fn test_starting_at() {
        assert_eq!(SimClock::starting_at(1000).now().as_ticks(), 1000);
    }

    #[test]
    fn test_monotonic_progression() {
        let mut clock = SimClock::new();
        let t1 = clock.now();
        clock.advance(Duration::from_ticks(10));
        let t2 = clock.now();
        clock.advance(Duration::from_ticks(0));
        let t3 = clock.now();

        assert!(t2 > t1);
        assert_eq!(t3, t2);
    }

    #[test]
    fn test_advance_saturates_at_max() {
        let mut clock = SimClock::starting_at(u64::MAX - 5);
        clock.advance(Duration::from_ticks(50));
        assert_eq!(clock.now().as_ticks(), u64::MAX);
    }
}
