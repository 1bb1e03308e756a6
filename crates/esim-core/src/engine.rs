//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Tick driven battery depletion engine."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::fmt;

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::battery::BatteryState;
use crate::errors::{Result, SimError};
use crate::frames::{SeriesSnapshot, TelemetrySample};
use crate::playlist::WorkloadPlaylist;
use crate::power_model::NoiseTrigger;
use crate::sink::SeriesSink;

/// Pack rating assumed when the vehicle does not report one.
pub const DEFAULT_NOMINAL_CAPACITY_MAH: u32 = 4000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub nominal_capacity_mah: u32,
    pub noise: NoiseTrigger,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            nominal_capacity_mah: DEFAULT_NOMINAL_CAPACITY_MAH,
            noise: NoiseTrigger::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No telemetry yet, so no battery.
    Uninitialized,
    /// Battery present, nothing to play.
    Idle,
    Running,
    /// Terminal.
    Depleted,
}

/// What one integrating tick did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub tick: u64,
    pub utilization: f64,
    pub watts: f64,
    pub energy_delta_joules: f64,
    pub capacity_joules: f64,
    pub battery_percent: f64,
    pub noise_applied: bool,
    pub profile_index: usize,
    pub bin_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No telemetry has arrived; nothing happened.
    AwaitingTelemetry,
    /// Telemetry refreshed, no workload attached to integrate.
    TelemetryOnly,
    Stepped(StepReport),
    /// The battery crossed zero on this tick. Reported exactly once.
    Depleted(StepReport),
}

impl TickOutcome {
    pub fn report(&self) -> Option<&StepReport> {
        match self {
            TickOutcome::Stepped(report) | TickOutcome::Depleted(report) => Some(report),
            TickOutcome::AwaitingTelemetry | TickOutcome::TelemetryOnly => None,
        }
    }

    pub fn is_depleted(&self) -> bool {
        matches!(self, TickOutcome::Depleted(_))
    }
}

/// Integrates workload power draw into a battery, one heartbeat at a time.
///
/// The engine owns no clock: the host measures the time between heartbeats
/// and passes it to [`SimulationEngine::on_tick`]. Telemetry and capacity
/// updates are pushed in between ticks whenever they arrive.
pub struct SimulationEngine<R = StdRng> {
    settings: EngineSettings,
    rng: R,
    battery: Option<BatteryState>,
    latest_telemetry: Option<TelemetrySample>,
    playlist: WorkloadPlaylist,
    history: SeriesSnapshot,
    sink: Box<dyn SeriesSink>,
    depleted: bool,
    ticks: u64,
}

impl SimulationEngine<StdRng> {
    pub fn new(settings: EngineSettings, seed: u64, sink: Box<dyn SeriesSink>) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed), sink)
    }
}

impl<R: Rng> SimulationEngine<R> {
    pub fn with_rng(settings: EngineSettings, rng: R, sink: Box<dyn SeriesSink>) -> Self {
        Self {
            settings,
            rng,
            battery: None,
            latest_telemetry: None,
            playlist: WorkloadPlaylist::empty(),
            history: SeriesSnapshot::default(),
            sink,
            depleted: false,
            ticks: 0,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn state(&self) -> EngineState {
        if self.depleted {
            EngineState::Depleted
        } else if self.battery.is_none() {
            EngineState::Uninitialized
        } else if self.playlist.is_empty() {
            EngineState::Idle
        } else {
            EngineState::Running
        }
    }

    pub fn battery(&self) -> Option<&BatteryState> {
        self.battery.as_ref()
    }

    pub fn playlist(&self) -> &WorkloadPlaylist {
        &self.playlist
    }

    pub fn history(&self) -> &SeriesSnapshot {
        &self.history
    }

    /// Integrating ticks performed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Replace the workload being played. The cursor restarts at the first bin.
    pub fn attach_workload(&mut self, playlist: WorkloadPlaylist) {
        info!(
            profiles = playlist.len(),
            names = ?playlist.profiles().iter().map(|p| p.name()).collect::<Vec<_>>(),
            "workload attached"
        );
        self.playlist = playlist;
    }

    /// Record a telemetry sample. The first one creates the battery at nominal capacity.
    pub fn on_telemetry(&mut self, sample: TelemetrySample) {
        if self.battery.is_none() {
            let mut battery = BatteryState::from_telemetry(&sample);
            battery.set_capacity_from_milliamp_hours(sample.voltage, self.settings.nominal_capacity_mah);
            info!(
                voltage = sample.voltage,
                nominal_capacity_mah = self.settings.nominal_capacity_mah,
                capacity_joules = battery.capacity_joules(),
                "battery initialised from first telemetry"
            );
            self.battery = Some(battery);
        }
        self.latest_telemetry = Some(sample);
    }

    /// Record a capacity rating reported by the vehicle.
    ///
    /// The rating sizes the battery created by the first telemetry sample. Once
    /// the battery exists its energy only drains, so later ratings are noted
    /// and otherwise ignored.
    pub fn on_capacity_parameter(&mut self, milliamp_hours: u32) {
        let previous_mah = self.settings.nominal_capacity_mah;
        self.settings.nominal_capacity_mah = milliamp_hours;
        match &self.battery {
            None => debug!(milliamp_hours, "capacity parameter stored before first telemetry"),
            Some(battery) => debug!(
                milliamp_hours,
                previous_mah,
                capacity_joules = battery.capacity_joules(),
                "capacity parameter after initialisation; remaining energy kept"
            ),
        }
    }

    /// Advance the simulation by `elapsed_seconds` of wall time.
    pub fn on_tick(&mut self, elapsed_seconds: f64) -> Result<TickOutcome> {
        if self.depleted {
            return Err(SimError::Depleted);
        }
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(SimError::InvalidElapsed(elapsed_seconds));
        }
        let Some(battery) = self.battery.as_mut() else {
            return Ok(TickOutcome::AwaitingTelemetry);
        };
        if let Some(sample) = &self.latest_telemetry {
            battery.refresh_telemetry(sample);
        }
        if self.playlist.is_empty() {
            warn!("tick without workload data; telemetry refreshed only");
            return Ok(TickOutcome::TelemetryOnly);
        }

        let (profile_index, bin_index) = self.playlist.position();
        let utilization = self.playlist.sample_current_utilization(&mut self.rng)?;

        let (watts, noise_applied) = match self.playlist.active_profile() {
            Some(profile) if profile.has_workload() => {
                let noise = self.settings.noise.fire(&mut self.rng);
                match profile
                    .power_model()
                    .evaluate(utilization, noise, &mut self.rng)
                {
                    Ok(watts) => (watts, noise),
                    Err(err) => {
                        warn!(
                            profile = profile.name(),
                            utilization,
                            error = %err,
                            "power model unusable for this tick, assuming zero draw"
                        );
                        (0.0, false)
                    }
                }
            }
            _ => (0.0, false),
        };

        let energy_delta_joules = watts * elapsed_seconds;
        battery.set_capacity_joules(battery.capacity_joules() - energy_delta_joules);
        let battery_percent = battery.capacity_percentage()? * 100.0;
        let capacity_joules = battery.capacity_joules();

        self.ticks += 1;
        self.history.tick = self.ticks;
        self.history.push(battery_percent, utilization);
        if let Err(err) = self.sink.publish(self.history.clone()) {
            warn!(tick = self.ticks, error = %err, "series sink rejected snapshot");
        }

        let report = StepReport {
            tick: self.ticks,
            utilization,
            watts,
            energy_delta_joules,
            capacity_joules,
            battery_percent,
            noise_applied,
            profile_index,
            bin_index,
        };
        debug!(
            tick = report.tick,
            profile = profile_index,
            bin = bin_index,
            utilization,
            watts,
            battery_percent,
            "simulation step"
        );

        if battery_percent <= 0.0 {
            self.depleted = true;
            info!(tick = report.tick, capacity_joules, "battery depleted");
            return Ok(TickOutcome::Depleted(report));
        }
        self.playlist.advance();
        Ok(TickOutcome::Stepped(report))
    }
}

impl<R> fmt::Debug for SimulationEngine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("settings", &self.settings)
            .field("battery", &self.battery)
            .field("position", &self.playlist.position())
            .field("ticks", &self.ticks)
            .field("depleted", &self.depleted)
            .finish_non_exhaustive()
    }
}
