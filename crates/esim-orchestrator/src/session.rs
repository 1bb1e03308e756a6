//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Session orchestration and lifecycle management."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use esim_common::config::AppConfig;
use esim_common::logging::drone_span;
use esim_common::metrics::LoopTimingReporter;
use esim_common::time::{jitter_us, monotonic_now, seconds_between};
use esim_core::{
    load_workload_dataset, ChannelSink, EngineSettings, NoiseTrigger, SimulationEngine,
    TickOutcome, WorkloadPlaylist, WorkloadProfile,
};
use esim_rt::{HeartbeatClock, TaskGroup};
use tokio::sync::broadcast;
use tracing::{debug, info, warn, Instrument};

use crate::recorder::{series_file_name, write_series_csv, RunSummary, SeriesRecorder};
use crate::telemetry::build_telemetry_source;

/// A fleet of simulated drones sharing one configuration and workload.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    config: Arc<AppConfig>,
    profiles: Arc<Vec<WorkloadProfile>>,
}

impl SimulationSession {
    /// Validate the configuration and load the workload dataset it names, if any.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let profiles = match &config.simulation.workload_path {
            Some(path) => load_workload_dataset(path)
                .with_context(|| format!("failed to load workload {}", path.display()))?,
            None => {
                warn!("no workload dataset configured; drones will only refresh telemetry");
                Vec::new()
            }
        };
        Ok(Self::with_profiles(config, profiles))
    }

    pub fn with_profiles(config: AppConfig, profiles: Vec<WorkloadProfile>) -> Self {
        Self {
            config: Arc::new(config),
            profiles: Arc::new(profiles),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn profiles(&self) -> &[WorkloadProfile] {
        &self.profiles
    }

    /// Spawn one task per drone and return a handle controlling the run.
    pub fn start(self) -> SessionHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(16);
        let mut tasks = TaskGroup::cancel_on_failure(shutdown_tx.clone());
        for drone_idx in 0..self.config.simulation.drones {
            let config = self.config.clone();
            let profiles = self.profiles.clone();
            let mut shutdown = shutdown_rx.resubscribe();
            let span = drone_span(
                drone_idx,
                config.simulation.offloading_method,
                config.simulation.seed_for_drone(drone_idx),
            );
            tasks.spawn(
                format!("drone-{drone_idx}"),
                async move { run_drone(drone_idx, &config, &profiles, &mut shutdown).await }
                    .instrument(span),
            );
        }
        info!(
            drones = self.config.simulation.drones,
            profiles = self.profiles.len(),
            offloading_method = %self.config.simulation.offloading_method,
            tick_interval_s = self.config.simulation.tick_interval.as_secs_f64(),
            "simulation session started"
        );
        SessionHandle {
            shutdown: shutdown_tx,
            tasks,
        }
    }
}

/// Lifecycle control over a running session.
#[derive(Debug)]
pub struct SessionHandle {
    shutdown: broadcast::Sender<()>,
    tasks: TaskGroup<RunSummary>,
}

impl SessionHandle {
    /// Sender that stops every drone when signalled.
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Wait until every drone has depleted, hit its tick limit, or been stopped.
    pub async fn wait(self) -> Result<Vec<RunSummary>> {
        let SessionHandle { shutdown, tasks } = self;
        let summaries = tasks.join().await;
        drop(shutdown);
        let summaries = summaries?;
        info!(drones = summaries.len(), "simulation session finished");
        Ok(summaries)
    }

    /// Stop every drone and collect their summaries.
    pub async fn shutdown(self) -> Result<Vec<RunSummary>> {
        let _ = self.shutdown.send(());
        self.wait().await
    }
}

fn engine_settings(config: &AppConfig) -> Result<EngineSettings> {
    let noise = NoiseTrigger::new(config.simulation.noise_probability)
        .context("invalid noise probability")?;
    Ok(EngineSettings {
        nominal_capacity_mah: config.battery.nominal_capacity_mah,
        noise,
    })
}

async fn run_drone(
    drone_idx: u32,
    config: &AppConfig,
    profiles: &[WorkloadProfile],
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<RunSummary> {
    let simulation = &config.simulation;
    let seed = simulation.seed_for_drone(drone_idx);
    let (sink, receiver) = ChannelSink::pair();
    let recorder = tokio::spawn(SeriesRecorder::new(drone_idx, receiver).run());

    let mut engine = SimulationEngine::new(engine_settings(config)?, seed, Box::new(sink));
    if !profiles.is_empty() {
        engine.attach_workload(WorkloadPlaylist::new(profiles.to_vec()));
    }
    let mut telemetry = build_telemetry_source(&config.telemetry)?;
    info!(
        drone_idx,
        seed,
        telemetry = telemetry.name(),
        offloading_method = %simulation.offloading_method,
        "drone simulation starting"
    );

    let mut clock = HeartbeatClock::new(simulation.tick_interval);
    let reporter = LoopTimingReporter::new(simulation.tick_interval);
    let started = monotonic_now();
    let started_at = Utc::now();
    let mut heartbeats: u64 = 0;
    let mut depleted = false;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!(drone_idx, "drone shutdown signal received");
                break;
            }
            elapsed = clock.tick() => {
                heartbeats += 1;
                reporter.record_interval(elapsed);
                let jitter = jitter_us(elapsed, clock.period());

                if let Some(reading) = telemetry.next_reading() {
                    if let Some(capacity_mah) = reading.capacity_mah {
                        if capacity_mah != engine.settings().nominal_capacity_mah {
                            engine.on_capacity_parameter(capacity_mah);
                        }
                    }
                    engine.on_telemetry(reading.sample);
                }

                match engine.on_tick(elapsed.as_secs_f64())? {
                    TickOutcome::Depleted(report) => {
                        info!(
                            drone_idx,
                            tick = report.tick,
                            elapsed_s = seconds_between(started, monotonic_now()),
                            "battery depleted; stopping drone"
                        );
                        depleted = true;
                        break;
                    }
                    TickOutcome::Stepped(report) => {
                        debug!(
                            drone_idx,
                            tick = report.tick,
                            battery_percent = report.battery_percent,
                            utilization = report.utilization,
                            watts = report.watts,
                            jitter_us = jitter,
                            "drone tick"
                        );
                    }
                    TickOutcome::AwaitingTelemetry | TickOutcome::TelemetryOnly => {
                        debug!(drone_idx, heartbeats, jitter_us = jitter, "heartbeat without integration");
                    }
                }

                if simulation.max_ticks.is_some_and(|limit| heartbeats >= limit) {
                    info!(drone_idx, heartbeats, "tick limit reached; stopping drone");
                    break;
                }
            }
        }
    }

    let steps = engine.ticks();
    drop(engine);
    let latest = recorder.await.context("series recorder task failed")?;

    let series_path = match (&config.output.series_directory, &latest) {
        (Some(directory), Some(snapshot)) => {
            let path = directory.join(series_file_name(drone_idx, simulation.offloading_method));
            write_series_csv(&path, snapshot)?;
            Some(path)
        }
        _ => None,
    };

    if let Some(summary) = reporter.summary() {
        debug!(
            drone_idx,
            samples = summary.samples,
            mean_ms = summary.mean_ms,
            std_dev_ms = summary.std_dev_ms,
            max_ms = summary.max_ms,
            "heartbeat jitter summary"
        );
    }

    Ok(RunSummary {
        drone_idx,
        offloading_method: simulation.offloading_method,
        heartbeats,
        steps,
        final_battery_percent: latest.as_ref().and_then(|s| s.latest()).map(|(p, _)| p),
        depleted,
        series_path,
        started_at,
        finished_at: Utc::now(),
    })
}
