//! # Client configuration.
//!
//! [`Config`] holds the ambient settings shared by every handle created from a
//! [`Client`](crate::Client).
//!
//! ## Sentinel values
//! - `default_delay = 0s` → requests start without a debounce delay
//! - `default_timeout = 0s` → no per-exchange timeout unless a request sets one
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use reqvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.default_delay = Duration::from_millis(300);
//!
//! assert_eq!(cfg.default_delay(), Some(Duration::from_millis(300)));
//! assert_eq!(cfg.default_timeout(), None);
//! ```

use std::{sync::Arc, time::Duration};

/// Settings shared by all request handles of one client.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `default_delay`: debounce before the first exchange of a generation when
///   the request sets none (`0s` = none)
/// - `default_timeout`: per-exchange timeout when the request sets none (`0s` = none)
/// - `default_name`: label used in logs/events for unnamed requests
#[derive(Clone, Debug)]
pub struct Config {
    pub bus_capacity: usize,
    pub default_delay: Duration,
    pub default_timeout: Duration,
    pub default_name: Arc<str>,
}

impl Config {
    /// Returns the default debounce delay as an `Option`.
    #[inline]
    pub fn default_delay(&self) -> Option<Duration> {
        (!self.default_delay.is_zero()).then_some(self.default_delay)
    }

    /// Returns the default per-exchange timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        (!self.default_timeout.is_zero()).then_some(self.default_timeout)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// - `bus_capacity = 1024`
    /// - `default_delay = 0s`
    /// - `default_timeout = 0s`
    /// - `default_name = "request"`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            default_delay: Duration::ZERO,
            default_timeout: Duration::ZERO,
            default_name: Arc::from("request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_none() {
        let cfg = Config::default();
        assert_eq!(cfg.default_delay(), None);
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
