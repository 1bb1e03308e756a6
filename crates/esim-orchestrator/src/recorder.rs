//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Consumer of the accumulated battery series."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use esim_common::config::OffloadingMethod;
use esim_core::SeriesSnapshot;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Outcome of one drone's run, as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub drone_idx: u32,
    pub offloading_method: OffloadingMethod,
    pub heartbeats: u64,
    pub steps: u64,
    pub final_battery_percent: Option<f64>,
    pub depleted: bool,
    pub series_path: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Drains the engine's snapshot channel, keeping only the newest history.
///
/// Every snapshot carries the full series, so the last one received is the
/// complete record of the run.
#[derive(Debug)]
pub struct SeriesRecorder {
    drone_idx: u32,
    receiver: mpsc::UnboundedReceiver<SeriesSnapshot>,
}

impl SeriesRecorder {
    pub fn new(drone_idx: u32, receiver: mpsc::UnboundedReceiver<SeriesSnapshot>) -> Self {
        Self {
            drone_idx,
            receiver,
        }
    }

    /// Runs until every sender is dropped.
    pub async fn run(mut self) -> Option<SeriesSnapshot> {
        let mut latest = None;
        while let Some(snapshot) = self.receiver.recv().await {
            if let Some((battery_percent, cpu_utilization)) = snapshot.latest() {
                debug!(
                    drone_idx = self.drone_idx,
                    tick = snapshot.tick,
                    battery_percent,
                    cpu_utilization,
                    "series point"
                );
            }
            latest = Some(snapshot);
        }
        latest
    }
}

#[derive(Debug, Serialize)]
struct SeriesRow {
    tick: usize,
    battery_percent: f64,
    cpu_utilization: f64,
}

/// `drone-<idx>-<method>.csv`.
pub fn series_file_name(drone_idx: u32, method: OffloadingMethod) -> String {
    format!("drone-{drone_idx}-{}.csv", method.as_str())
}

/// Write the series as `tick,battery_percent,cpu_utilization` rows.
pub fn write_series_csv(path: &Path, snapshot: &SeriesSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create series directory {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("unable to create series file {}", path.display()))?;
    for (index, (battery_percent, cpu_utilization)) in snapshot
        .battery_percent
        .iter()
        .zip(&snapshot.cpu_utilization)
        .enumerate()
    {
        writer.serialize(SeriesRow {
            tick: index + 1,
            battery_percent: *battery_percent,
            cpu_utilization: *cpu_utilization,
        })?;
    }
    writer
        .flush()
        .with_context(|| format!("unable to flush series file {}", path.display()))?;
    info!(path = %path.display(), points = snapshot.len(), "battery series written");
    Ok(())
}
