//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Shared primitives and utilities for the simulator runtime."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

/// Capture an instant suitable for tick comparisons.
pub fn monotonic_now() -> Instant {
    Instant::now()
}

/// Seconds elapsed between two instants, zero when `later` precedes `earlier`.
pub fn seconds_between(earlier: Instant, later: Instant) -> f64 {
    later.saturating_duration_since(earlier).as_secs_f64()
}

/// Signed deviation of `actual` from `expected` in microseconds.
pub fn jitter_us(actual: Duration, expected: Duration) -> i64 {
    let actual_us = actual.as_secs_f64() * 1_000_000.0;
    let expected_us = expected.as_secs_f64() * 1_000_000.0;
    (actual_us - expected_us).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_between_saturates() {
        let start = monotonic_now();
        let later = start + Duration::from_millis(1500);
        assert_eq!(seconds_between(start, later), 1.5);
        assert_eq!(seconds_between(later, start), 0.0);
    }

    #[test]
    fn jitter_is_signed() {
        let expected = Duration::from_secs(1);
        assert_eq!(jitter_us(Duration::from_millis(1002), expected), 2_000);
        assert_eq!(jitter_us(Duration::from_millis(999), expected), -1_000);
    }
}
