//! # meshsim-engine::clock
//!
//! The monotonic logical clock. No real-time pacing lives
//! here; the Driver decides whether and how long to sleep between ticks.

use meshsim_types::time::{SimTime, SIM_EPOCH};

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    now: SimTime,
}

impl Default for Clock {
    fn default() -> Self {
        Self { now: SIM_EPOCH }
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Advances the clock to `target`. `target` must be `>= now()`; this is
    /// an engine invariant, not
    /// a recoverable error, so callers that could violate it are bugs.
    pub fn advance_to(&mut self, target: SimTime) {
        assert!(
            target >= self.now,
            "clock cannot move backwards: {target} < {}",
            self.now
        );
        self.now = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_epoch() {
        assert_eq!(Clock::new().now(), SIM_EPOCH);
    }

    #[test]
    fn advances_forward() {
        let mut clock = Clock::new();
        clock.advance_to(10);
        clock.advance_to(20);
        assert_eq!(clock.now(), 20);
    }

    #[test]
    #[should_panic]
    fn rejects_backwards_motion() {
        let mut clock = Clock::new();
        clock.advance_to(10);
        clock.advance_to(5);
    }
}
