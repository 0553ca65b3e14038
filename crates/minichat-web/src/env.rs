//! Web view environment.
//!
//! Monotonic time comes from `performance.now()` (falling back to
//! `Date.now()` outside a window), wall-clock time from `Date.now()`, and
//! randomness from `crypto.getRandomValues` through `getrandom`.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

use minichat_core::Environment;

/// Point on the web view's monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WebInstant(Duration);

impl WebInstant {
    /// Instant `millis` after the time origin. Invalid readings clamp to zero.
    pub fn from_millis_f64(millis: f64) -> Self {
        Self(Duration::try_from_secs_f64(millis / 1000.0).unwrap_or_default())
    }

    /// Time since the page's time origin.
    pub fn since_origin(self) -> Duration {
        self.0
    }
}

impl Sub for WebInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for WebInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

/// Environment backed by browser APIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebEnv;

impl WebEnv {
    /// Create a web environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for WebEnv {
    type Instant = WebInstant;

    fn now(&self) -> WebInstant {
        let millis = web_sys::window()
            .and_then(|window| window.performance())
            .map_or_else(js_sys::Date::now, |performance| performance.now());
        WebInstant::from_millis_f64(millis)
    }

    fn wall_clock_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::getrandom(buffer)
            .expect("invariant: crypto.getRandomValues is available in every supported web view");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instants_order_and_subtract() {
        let a = WebInstant::from_millis_f64(1_500.0);
        let b = a + Duration::from_millis(250);

        assert!(b > a);
        assert_eq!(b - a, Duration::from_millis(250));
        assert_eq!(a - b, Duration::ZERO);
    }

    #[test]
    fn invalid_readings_clamp_to_origin() {
        assert_eq!(WebInstant::from_millis_f64(-3.0).since_origin(), Duration::ZERO);
        assert_eq!(WebInstant::from_millis_f64(f64::NAN).since_origin(), Duration::ZERO);
    }
}
