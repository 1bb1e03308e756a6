//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Telemetry inputs and series outputs exchanged with the host."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Raw battery telemetry as reported by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub voltage: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub level: Option<f64>,
}

impl TelemetrySample {
    pub fn new(voltage: f64, current: f64, level: Option<f64>) -> Self {
        Self {
            voltage,
            current,
            level,
        }
    }
}

/// Accumulated output series published after every integrating tick.
///
/// Both vectors always have the same length and only ever grow, so a consumer
/// can redraw a full chart from any single snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub tick: u64,
    pub battery_percent: Vec<f64>,
    pub cpu_utilization: Vec<f64>,
}

impl SeriesSnapshot {
    pub fn len(&self) -> usize {
        self.battery_percent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battery_percent.is_empty()
    }

    /// Most recent `(battery_percent, cpu_utilization)` pair.
    pub fn latest(&self) -> Option<(f64, f64)> {
        Some((
            *self.battery_percent.last()?,
            *self.cpu_utilization.last()?,
        ))
    }

    pub(crate) fn push(&mut self, battery_percent: f64, cpu_utilization: f64) {
        self.battery_percent.push(battery_percent);
        self.cpu_utilization.push(cpu_utilization);
    }
}
