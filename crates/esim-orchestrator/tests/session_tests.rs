//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "test"
//! esim_scope: "code"
//! esim_description: "Session orchestration and lifecycle management."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::fs;
use std::str::FromStr;

use esim_common::config::{AppConfig, OffloadingMethod};
use esim_orchestrator::SimulationSession;
use tempfile::tempdir;

const WORKLOAD: &str = r#"{
    "survey_partial": {
        "cpu_bins": {
            "0": {"mean": 35.0, "std": 3.0, "n": 50},
            "1": {"mean": 62.0, "std": 4.0, "n": 30}
        },
        "bin_ordering": [0, 1, 1],
        "regression": {"coefs": [0.0, 0.05, 4.0], "poly_stds": [], "r_2": 0.9}
    }
}"#;

#[tokio::test(start_paused = true)]
async fn session_runs_fleet_from_files_and_writes_series() {
    let dir = tempdir().expect("tempdir");
    let workload = dir.path().join("workload.json");
    fs::write(&workload, WORKLOAD).expect("workload written");
    let replay = dir.path().join("telemetry.csv");
    fs::write(
        &replay,
        "voltage,current,level,capacity_mah\n12.6,0.5,1.0,\n12.5,0.6,0.98,\n12.4,0.7,0.97,2\n",
    )
    .expect("telemetry written");
    let series = dir.path().join("series");

    let config = AppConfig::from_str(&format!(
        r#"
        [battery]
        nominal_capacity_mah = 2

        [simulation]
        workload_path = "{workload}"
        random_seed = 7
        noise_probability = 0.0
        tick_interval = 5.0
        offloading_method = "partial"
        drones = 2
        max_ticks = 500

        [telemetry]
        replay_file = "{replay}"

        [output]
        series_directory = "{series}"
        "#,
        workload = workload.display(),
        replay = replay.display(),
        series = series.display(),
    ))
    .expect("config parses");

    let session = SimulationSession::new(config).expect("session builds");
    assert_eq!(session.profiles().len(), 1);
    let summaries = session.start().wait().await.expect("session completes");

    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert!(summary.depleted, "drone {} did not deplete", summary.drone_idx);
        assert_eq!(summary.offloading_method, OffloadingMethod::Partial);
        assert!(summary.steps > 1);
        let path = summary.series_path.as_ref().expect("series path");
        assert!(path.ends_with(format!("drone-{}-partial.csv", summary.drone_idx)));
        let rows = fs::read_to_string(path).expect("series readable");
        assert_eq!(rows.lines().count() as u64, summary.steps + 1);
    }
}
