//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Telemetry sources feeding the simulation engine."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use esim_common::config::TelemetryConfig;
use esim_core::TelemetrySample;

use crate::replay::TelemetryReplay;

/// One telemetry update, optionally carrying a capacity rating reported by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReading {
    pub sample: TelemetrySample,
    pub capacity_mah: Option<u32>,
}

impl From<TelemetrySample> for TelemetryReading {
    fn from(sample: TelemetrySample) -> Self {
        Self {
            sample,
            capacity_mah: None,
        }
    }
}

/// Push-style telemetry feed polled once per heartbeat.
pub trait TelemetrySource: Send {
    /// Next reading, or `None` when the source has nothing new.
    fn next_reading(&mut self) -> Option<TelemetryReading>;
    /// Human-readable source name for logging.
    fn name(&self) -> &'static str;
}

/// Reports the same configured reading on every heartbeat.
#[derive(Debug, Clone)]
pub struct StaticTelemetry {
    reading: TelemetryReading,
}

impl StaticTelemetry {
    pub fn new(sample: TelemetrySample) -> Self {
        Self {
            reading: sample.into(),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(TelemetrySample::new(
            config.voltage,
            config.current,
            config.level,
        ))
    }
}

impl TelemetrySource for StaticTelemetry {
    fn next_reading(&mut self) -> Option<TelemetryReading> {
        Some(self.reading)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Replay file when configured, constants otherwise.
pub fn build_telemetry_source(config: &TelemetryConfig) -> Result<Box<dyn TelemetrySource>> {
    match &config.replay_file {
        Some(path) => {
            let replay = TelemetryReplay::from_path(path)
                .with_context(|| format!("unable to load telemetry replay {}", path.display()))?;
            Ok(Box::new(replay))
        }
        None => Ok(Box::new(StaticTelemetry::from_config(config))),
    }
}
