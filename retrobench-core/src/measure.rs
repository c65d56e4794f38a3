//! Wall-Clock Measurement
//!
//! Monotonic timing for the measurement phase. The deadline is polled, never
//! slept on: per-step latency ranges from microseconds to tens of
//! milliseconds across cores, and a blocking wait adds scheduler jitter.

use std::time::{Duration, Instant};

/// Floor applied to every measured interval, in seconds.
///
/// Keeps `steps / elapsed` finite when the interval is below clock resolution.
pub const MIN_ELAPSED_SECONDS: f64 = 1e-9;

/// Deadline-bounded stopwatch for the timed phase
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start the clock now with the given budget in seconds.
    ///
    /// Budgets too large for a `Duration` saturate to the maximum.
    #[inline]
    pub fn start(budget_seconds: f64) -> Self {
        let budget = Duration::try_from_secs_f64(budget_seconds).unwrap_or(Duration::MAX);
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// Whether the budget has been used up. Checked before each step.
    #[inline(always)]
    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    /// Time since the clock started
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed seconds, floored to [`MIN_ELAPSED_SECONDS`]
    #[inline]
    pub fn elapsed_seconds(&self) -> f64 {
        floor_elapsed(self.start.elapsed().as_secs_f64())
    }
}

/// Clamp a measured interval to the minimum representable elapsed time.
#[inline]
pub fn floor_elapsed(seconds: f64) -> f64 {
    if seconds.is_nan() {
        return MIN_ELAPSED_SECONDS;
    }
    seconds.max(MIN_ELAPSED_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_expires() {
        let deadline = Deadline::start(0.005);
        assert!(!deadline.expired());
        std::thread::sleep(Duration::from_millis(10));
        assert!(deadline.expired());
        assert!(deadline.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_zero_interval_is_floored() {
        assert_eq!(floor_elapsed(0.0), MIN_ELAPSED_SECONDS);
        assert_eq!(floor_elapsed(-1.0), MIN_ELAPSED_SECONDS);
        assert_eq!(floor_elapsed(f64::NAN), MIN_ELAPSED_SECONDS);
        assert_eq!(floor_elapsed(2.5), 2.5);
    }

    #[test]
    fn test_huge_budget_saturates() {
        let deadline = Deadline::start(1e30);
        assert!(!deadline.expired());
        assert!(deadline.elapsed_seconds() > 0.0);
    }
}
