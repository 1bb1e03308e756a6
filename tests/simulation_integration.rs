//! ---
//! esim_section: "15-testing-qa-runbook"
//! esim_subsection: "integration-tests"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Integration and validation tests for the esim stack."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use esim_common::config::{AppConfig, OffloadingMethod};
use esim_core::{load_workload_dataset, SimError};
use esim_orchestrator::SimulationSession;
use tempfile::tempdir;

fn repo_path(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(path)
}

fn example_config() -> AppConfig {
    let full = repo_path("configs/esim.example.toml");
    let raw = fs::read_to_string(&full)
        .unwrap_or_else(|err| panic!("failed to read {}: {}", full.display(), err));
    AppConfig::from_str(&raw).expect("example configuration must parse")
}

#[test]
fn example_configuration_matches_reference_vehicle() {
    let config = example_config();
    assert_eq!(config.battery.nominal_capacity_mah, 4000);
    assert_eq!(config.telemetry.voltage, 12.6);
    assert_eq!(config.simulation.offloading_method, OffloadingMethod::Onboard);
    assert_eq!(
        config.simulation.workload_path.as_deref(),
        Some(Path::new("configs/workloads/drone_pairs.json"))
    );
}

#[test]
fn bundled_workload_dataset_is_valid() {
    let profiles = load_workload_dataset(repo_path("configs/workloads/drone_pairs.json"))
        .expect("bundled workload must validate");
    assert!(!profiles.is_empty());
    for profile in &profiles {
        assert!(profile.has_workload(), "{} has no workload", profile.name());
        assert!(profile.power_model().r_squared().is_some());
    }
}

#[test]
fn dataset_missing_ordering_is_rejected_wholesale() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    let dataset = fs::read_to_string(repo_path("configs/workloads/drone_pairs.json"))
        .expect("bundled workload readable")
        .replacen("\"bin_ordering\"", "\"ordering\"", 1);
    fs::write(&path, dataset).expect("dataset written");

    match load_workload_dataset(&path) {
        Err(SimError::Configuration { context, reason }) => {
            assert!(context.contains("profile"), "{context}");
            assert!(reason.contains("bin_ordering"), "{reason}");
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn example_fleet_runs_to_tick_limit() -> anyhow::Result<()> {
    let series = tempdir()?;
    let mut config = example_config();
    config.simulation.workload_path = Some(repo_path("configs/workloads/drone_pairs.json"));
    config.simulation.drones = 2;
    config.simulation.max_ticks = Some(30);
    config.output.series_directory = Some(series.path().to_path_buf());

    let summaries = SimulationSession::new(config)?.start().wait().await?;
    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert_eq!(summary.heartbeats, 30);
        assert_eq!(summary.steps, 30);
        assert!(!summary.depleted);
        let percent = summary.final_battery_percent.expect("series recorded");
        assert!(percent > 90.0 && percent < 100.0, "unexpected percent {percent}");
        let path = summary.series_path.as_ref().expect("series file");
        assert_eq!(fs::read_to_string(path)?.lines().count(), 31);
    }
    assert_ne!(
        summaries[0].final_battery_percent,
        summaries[1].final_battery_percent,
        "drones should draw from independent random streams"
    );
    Ok(())
}
