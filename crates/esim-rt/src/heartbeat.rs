//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Runtime helpers supporting the simulation session."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Periodic heartbeat reporting the wall time measured since the previous beat.
///
/// Late beats are delayed rather than bursted, so a stalled host produces one
/// long elapsed interval instead of a run of zero-length ones.
#[derive(Debug)]
pub struct HeartbeatClock {
    interval: Interval,
    period: Duration,
    last: Instant,
}

impl HeartbeatClock {
    pub fn new(period: Duration) -> Self {
        let now = Instant::now();
        let mut interval = tokio::time::interval_at(now + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            period,
            last: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next beat and return the elapsed time since the previous one,
    /// or since construction for the first beat.
    pub async fn tick(&mut self) -> Duration {
        let now = self.interval.tick().await;
        let now = now.max(Instant::now());
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_beat_waits_one_period() {
        let mut clock = HeartbeatClock::new(Duration::from_secs(1));
        let elapsed = clock.tick().await;
        assert_eq!(elapsed, Duration::from_secs(1));
        assert_eq!(clock.period(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_beats_report_measured_time() {
        let mut clock = HeartbeatClock::new(Duration::from_millis(500));
        assert_eq!(clock.tick().await.as_secs_f64(), 0.5);
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let late = clock.tick().await;
        assert!(late >= Duration::from_millis(1200), "late beat measured {late:?}");
        let next = clock.tick().await;
        assert_eq!(next, Duration::from_millis(500));
    }
}
