//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Shared primitives and utilities for the simulator runtime."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Summary of heartbeat interval deviations, in milliseconds.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JitterSummary {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub max_ms: f64,
    pub samples: u64,
}

/// Tracks how far measured heartbeat intervals stray from the configured period.
///
/// The engine tolerates irregular ticks; this only feeds the end-of-run log.
#[derive(Debug)]
pub struct LoopTimingReporter {
    target_interval: Duration,
    deviations_ms: Mutex<Vec<f64>>,
}

impl LoopTimingReporter {
    pub fn new(target_interval: Duration) -> Self {
        Self {
            target_interval,
            deviations_ms: Mutex::new(Vec::new()),
        }
    }

    /// Record one measured interval between consecutive heartbeats.
    pub fn record_interval(&self, actual: Duration) {
        let deviation = if actual > self.target_interval {
            actual - self.target_interval
        } else {
            self.target_interval - actual
        };
        self.deviations_ms
            .lock()
            .push(deviation.as_secs_f64() * 1_000.0);
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        let samples = self.deviations_ms.lock();
        if samples.is_empty() {
            return None;
        }
        let count = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / count;
        let variance = if samples.len() > 1 {
            samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0)
        } else {
            0.0
        };
        Some(JitterSummary {
            mean_ms: mean,
            std_dev_ms: variance.sqrt(),
            max_ms: samples.iter().copied().fold(0.0, f64::max),
            samples: samples.len() as u64,
        })
    }
}
