//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "binary"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Binary entrypoint for the esim daemon."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use esim_common::config::{AppConfig, OffloadingMethod};
use esim_common::logging::init_tracing;
use esim_core::load_workload_dataset;
use esim_orchestrator::{RunSummary, SimulationSession};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about = "Drone battery depletion simulator", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Workload dataset (JSON) overriding the configuration")]
    workload: Option<PathBuf>,

    #[arg(long, help = "Random seed for the first drone")]
    seed: Option<u64>,

    #[arg(long, help = "Number of drones to simulate")]
    drones: Option<u32>,

    #[arg(long = "off-method", value_enum, help = "Offloading method label")]
    off_method: Option<OffloadingMethod>,

    #[arg(long, help = "Stop each drone after this many heartbeats")]
    max_ticks: Option<u64>,

    #[arg(long = "nominal-capacity-mah", help = "Battery rating applied at first telemetry")]
    nominal_capacity_mah: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the simulation until depletion, tick limit, or ctrl-c")]
    Run,
    #[command(about = "Validate the workload dataset and print its profiles")]
    Validate,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.workload {
            config.simulation.workload_path = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            config.simulation.random_seed = seed;
        }
        if let Some(drones) = self.drones {
            config.simulation.drones = drones;
        }
        if let Some(method) = self.off_method {
            config.simulation.offloading_method = method;
        }
        if let Some(limit) = self.max_ticks {
            config.simulation.max_ticks = Some(limit);
        }
        if let Some(capacity) = self.nominal_capacity_mah {
            config.battery.nominal_capacity_mah = capacity;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/esim.toml"));
    candidates.push(PathBuf::from("configs/esim.example.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration after CLI overrides")?;

    init_tracing("esimd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; running with defaults"),
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_session(config).await,
        Commands::Validate => validate_workload(&config),
    }
}

async fn run_session(config: AppConfig) -> Result<()> {
    let session = SimulationSession::new(config)?;
    let handle = session.start();

    let shutdown = handle.shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received; stopping drones");
                let _ = shutdown.send(());
            }
            Err(err) => warn!(error = %err, "unable to listen for ctrl-c"),
        }
    });

    let summaries = handle.wait().await?;
    for summary in &summaries {
        render_summary(summary)?;
    }
    Ok(())
}

fn render_summary(summary: &RunSummary) -> Result<()> {
    info!(
        drone_idx = summary.drone_idx,
        offloading_method = %summary.offloading_method,
        steps = summary.steps,
        depleted = summary.depleted,
        final_battery_percent = ?summary.final_battery_percent,
        "drone finished"
    );
    println!("{}", serde_json::to_string(summary)?);
    Ok(())
}

fn validate_workload(config: &AppConfig) -> Result<()> {
    let Some(path) = &config.simulation.workload_path else {
        bail!("no workload dataset configured; pass --workload or set simulation.workload_path");
    };
    let profiles = load_workload_dataset(path)
        .with_context(|| format!("workload dataset {} is invalid", path.display()))?;
    for profile in &profiles {
        let model = profile.power_model();
        println!(
            "{name}: bins={bins} ordering={ordering} coefficients={coefficients} r_2={r_squared}",
            name = profile.name(),
            bins = profile.bins().len(),
            ordering = profile.bin_ordering().len(),
            coefficients = model.coefficients().len(),
            r_squared = model
                .r_squared()
                .map(|value| format!("{value:.3}"))
                .unwrap_or_else(|| "n/a".into()),
        );
        if !profile.has_workload() {
            warn!(profile = profile.name(), "profile has no bins or ordering; it will draw no power");
        }
    }
    info!(path = %path.display(), profiles = profiles.len(), "workload dataset valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_configuration_values() {
        let cli = Cli::parse_from([
            "esimd",
            "--workload",
            "data/pairs.json",
            "--seed",
            "11",
            "--drones",
            "4",
            "--off-method",
            "full",
            "--max-ticks",
            "90",
            "--nominal-capacity-mah",
            "5200",
            "run",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(
            config.simulation.workload_path,
            Some(PathBuf::from("data/pairs.json"))
        );
        assert_eq!(config.simulation.random_seed, 11);
        assert_eq!(config.simulation.drones, 4);
        assert_eq!(config.simulation.offloading_method, OffloadingMethod::Full);
        assert_eq!(config.simulation.max_ticks, Some(90));
        assert_eq!(config.battery.nominal_capacity_mah, 5200);
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn defaults_to_run_without_overrides() {
        let cli = Cli::parse_from(["esimd"]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert!(cli.command.is_none());
        assert_eq!(config.simulation.drones, 1);
        assert_eq!(config.simulation.workload_path, None);
    }

    #[test]
    fn validate_requires_a_workload() {
        let err = validate_workload(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no workload dataset configured"));
    }
}
