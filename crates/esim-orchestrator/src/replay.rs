//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Recorded telemetry replay for simulation sessions."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use esim_core::TelemetrySample;
use serde::Deserialize;

use crate::telemetry::{TelemetryReading, TelemetrySource};

/// Raw row representation shared by the JSON and CSV formats.
#[derive(Debug, Deserialize)]
pub struct ReplayRow {
    pub voltage: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub level: Option<f64>,
    #[serde(default)]
    pub capacity_mah: Option<u32>,
}

impl ReplayRow {
    /// Same voltage rule as static telemetry: a battery needs a positive, finite voltage.
    fn into_reading(self, path: &Path, row: usize) -> Result<TelemetryReading> {
        if !self.voltage.is_finite() || self.voltage <= 0.0 {
            anyhow::bail!(
                "telemetry row {row} in {} has invalid voltage {}",
                path.display(),
                self.voltage
            );
        }
        Ok(TelemetryReading {
            sample: TelemetrySample::new(self.voltage, self.current, self.level),
            capacity_mah: self.capacity_mah,
        })
    }
}

/// Recorded telemetry played back one reading per heartbeat, wrapping at the end.
#[derive(Debug, Default, Clone)]
pub struct TelemetryReplay {
    readings: Vec<TelemetryReading>,
    cursor: usize,
}

impl TelemetryReplay {
    pub fn new(readings: Vec<TelemetryReading>) -> Self {
        Self {
            readings,
            cursor: 0,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(path),
            Some("csv") => Self::from_csv(path),
            _ => anyhow::bail!("unsupported telemetry replay format: {}", path.display()),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    fn from_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read telemetry file {}", path.display()))?;
        let rows: Vec<ReplayRow> = serde_json::from_str(&contents)
            .with_context(|| format!("invalid telemetry JSON {}", path.display()))?;
        let readings = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| row.into_reading(path, index + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(readings))
    }

    fn from_csv(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("unable to open telemetry csv {}", path.display()))?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut readings = Vec::new();
        for (index, row) in reader.deserialize::<ReplayRow>().enumerate() {
            let row = row.with_context(|| format!("invalid telemetry row in {}", path.display()))?;
            readings.push(row.into_reading(path, index + 1)?);
        }
        Ok(Self::new(readings))
    }
}

impl TelemetrySource for TelemetryReplay {
    fn next_reading(&mut self) -> Option<TelemetryReading> {
        if self.readings.is_empty() {
            return None;
        }
        let reading = self.readings[self.cursor];
        self.cursor = (self.cursor + 1) % self.readings.len();
        Some(reading)
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
