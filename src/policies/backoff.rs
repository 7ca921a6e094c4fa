//! # Backoff schedule for retry and poll delays.
//!
//! [`BackoffPolicy`] turns an attempt index into the delay handed back from a
//! `should_retry` decision. The delay for index `n` is `first × factor^n`,
//! clamped to `max`, with jitter applied to the clamped value only.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use reqvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(4),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay(0), Duration::from_millis(250));
//! assert_eq!(backoff.delay(2), Duration::from_secs(1));
//! assert_eq!(backoff.delay(9), Duration::from_secs(4));
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Exponential (or constant) delay schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay for index 0.
    pub first: Duration,
    /// Upper bound applied before jitter.
    pub max: Duration,
    /// Growth per index; `1.0` keeps the delay constant.
    pub factor: f64,
    /// Randomisation applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 1s, capped at 30s, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Always waits `every`.
    pub fn constant(every: Duration) -> Self {
        Self {
            first: every,
            max: every,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Doubles from `first` up to `max`.
    pub fn exponential(first: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns a copy with a different jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay for the given 0-based index.
    pub fn delay(&self, index: u32) -> Duration {
        let exp = index.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_never_grows() {
        let b = BackoffPolicy::constant(Duration::from_millis(300));
        for i in 0..8 {
            assert_eq!(b.delay(i), Duration::from_millis(300));
        }
    }

    #[test]
    fn exponential_doubles_then_caps() {
        let b = BackoffPolicy::exponential(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(b.delay(0), Duration::from_millis(100));
        assert_eq!(b.delay(1), Duration::from_millis(200));
        assert_eq!(b.delay(2), Duration::from_millis(400));
        assert_eq!(b.delay(3), Duration::from_millis(500));
        assert_eq!(b.delay(u32::MAX), Duration::from_millis(500));
    }

    #[test]
    fn first_above_max_is_clamped() {
        let b = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(2),
            factor: 1.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(b.delay(0), Duration::from_secs(2));
    }

    #[test]
    fn equal_jitter_stays_within_upper_half() {
        let b =
            BackoffPolicy::constant(Duration::from_millis(800)).with_jitter(JitterPolicy::Equal);
        for i in 0..32 {
            let d = b.delay(i);
            assert!(d >= Duration::from_millis(400) && d <= Duration::from_millis(800), "{d:?}");
        }
    }
}
