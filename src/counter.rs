// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Hysteresis repetition counter.
//!
//! A repetition counts when a passing posture verdict is held continuously for
//! [`HOLD_THRESHOLD`]. After counting, the counter re-arms: the posture must be
//! re-entered and held again before the next repetition counts, so a single
//! long hold never counts twice.
//!
//! Time is always a caller-supplied monotonic [`Instant`]; the counter never
//! reads the wall clock.

use std::time::{Duration, Instant};

/// Minimum continuous duration of a passing verdict to count one repetition.
pub const HOLD_THRESHOLD: Duration = Duration::from_millis(200);

/// Hold state of the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldState {
    /// Not currently holding a good posture.
    Idle,
    /// Holding a good posture since the recorded instant.
    Holding { since: Instant },
}

/// Per-session repetition counter.
///
/// Owned exclusively by the pipeline's processing unit; mutated only through
/// [`update`](RepCounter::update) and [`reset`](RepCounter::reset).
#[derive(Debug)]
pub struct RepCounter {
    count: u32,
    state: HoldState,
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RepCounter {
    /// Create a counter at zero, not holding.
    #[must_use]
    pub const fn new() -> Self {
        Self { count: 0, state: HoldState::Idle }
    }

    /// Current repetition count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Feed one frame's verdict at monotonic time `now`.
    ///
    /// Returns `Some(new_count)` exactly when this transition increments the
    /// count, `None` otherwise.
    pub fn update(&mut self, good_posture: bool, now: Instant) -> Option<u32> {
        match (self.state, good_posture) {
            (HoldState::Idle, false) => None,
            (HoldState::Idle, true) => {
                self.state = HoldState::Holding { since: now };
                None
            }
            (HoldState::Holding { .. }, false) => {
                // Broken hold: no partial credit.
                self.state = HoldState::Idle;
                None
            }
            (HoldState::Holding { since }, true) => {
                if now.duration_since(since) >= HOLD_THRESHOLD {
                    self.count += 1;
                    self.state = HoldState::Idle;
                    Some(self.count)
                } else {
                    None
                }
            }
        }
    }

    /// Reset to zero and stop holding. Returns the new count (always 0).
    ///
    /// Idempotent: repeated resets keep the counter at zero.
    pub fn reset(&mut self) -> u32 {
        self.count = 0;
        self.state = HoldState::Idle;
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_short_hold_does_not_count() {
        let t0 = Instant::now();
        let mut counter = RepCounter::new();

        assert_eq!(counter.update(true, t0), None);
        assert_eq!(counter.update(true, t0 + ms(100)), None);
        assert_eq!(counter.update(false, t0 + ms(150)), None);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_held_threshold_counts_once() {
        let t0 = Instant::now();
        let mut counter = RepCounter::new();

        assert_eq!(counter.update(true, t0), None);
        assert_eq!(counter.update(true, t0 + ms(250)), Some(1));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_continuous_hold_rearms() {
        // 600 ms of continuous good verdicts at a 50 ms frame cadence: one rep
        // at the 200 ms mark, then a fresh 200 ms hold counts the next.
        let t0 = Instant::now();
        let mut counter = RepCounter::new();

        let mut increments = 0;
        for i in 0..=12 {
            if counter.update(true, t0 + ms(i * 50)).is_some() {
                increments += 1;
            }
        }
        // Reps at t=200 (held since 0) and t=450 (held since 250).
        assert_eq!(increments, 2);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_single_window_counts_exactly_once() {
        let t0 = Instant::now();
        let mut counter = RepCounter::new();

        assert_eq!(counter.update(true, t0), None);
        assert_eq!(counter.update(true, t0 + ms(300)), Some(1));
        // Re-armed: the very next good frame starts a new hold.
        assert_eq!(counter.update(true, t0 + ms(320)), None);
        assert_eq!(counter.update(false, t0 + ms(340)), None);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_bad_verdict_clears_hold_start() {
        let t0 = Instant::now();
        let mut counter = RepCounter::new();

        assert_eq!(counter.update(true, t0), None);
        assert_eq!(counter.update(false, t0 + ms(150)), None);
        // The earlier partial hold must not carry over.
        assert_eq!(counter.update(true, t0 + ms(160)), None);
        assert_eq!(counter.update(true, t0 + ms(300)), None);
        assert_eq!(counter.update(true, t0 + ms(370)), Some(1));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let t0 = Instant::now();
        let mut counter = RepCounter::new();

        counter.update(true, t0);
        counter.update(true, t0 + ms(250));
        assert_eq!(counter.count(), 1);

        assert_eq!(counter.reset(), 0);
        assert_eq!(counter.reset(), 0);
        assert_eq!(counter.reset(), 0);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_idle_stays_idle_on_bad_verdicts() {
        let t0 = Instant::now();
        let mut counter = RepCounter::new();
        for i in 0..5 {
            assert_eq!(counter.update(false, t0 + ms(i * 33)), None);
        }
        assert_eq!(counter.count(), 0);
    }
}
