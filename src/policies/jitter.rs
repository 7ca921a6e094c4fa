//! # Jitter applied to backoff delays.
//!
//! Handles polling the same endpoint from many places tend to line up; jitter
//! spreads their retries apart.

use std::time::Duration;

use rand::Rng;

/// Randomisation applied to a computed delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact delay.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// `delay/2 + uniform[0, delay/2]`.
    Equal,
}

impl JitterPolicy {
    /// Applies the jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return delay;
        }
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 { 0 } else { rand::rng().random_range(0..=half) };
                Duration::from_millis(half + extra)
            }
        }
    }
}
