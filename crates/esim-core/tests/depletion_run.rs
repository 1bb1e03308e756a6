//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "test"
//! esim_scope: "code"
//! esim_description: "Runs a recorded drone workload until the battery is empty."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::path::PathBuf;

use esim_core::{
    load_workload_dataset, EngineSettings, EngineState, MemorySink, NoiseTrigger, SimError,
    SimulationEngine, TelemetrySample, TickOutcome, WorkloadPlaylist,
};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/drone_workload.json")
}

#[test]
fn recorded_workload_drains_battery_to_depletion() -> anyhow::Result<()> {
    let profiles = load_workload_dataset(fixture())?;
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].name(), "mapping_onboard");

    let sink = MemorySink::new();
    let settings = EngineSettings {
        nominal_capacity_mah: 1000,
        noise: NoiseTrigger::default(),
    };
    let mut engine = SimulationEngine::new(settings, 2024, Box::new(sink.clone()));
    engine.on_telemetry(TelemetrySample::new(12.6, 0.8, Some(1.0)));
    engine.attach_workload(WorkloadPlaylist::new(profiles));
    assert_eq!(engine.state(), EngineState::Running);

    let mut previous_percent = 100.0;
    let mut depleted_at = None;
    for _ in 0..10_000 {
        match engine.on_tick(60.0)? {
            TickOutcome::Stepped(report) => {
                assert!((0.0..=100.0).contains(&report.utilization));
                assert!(report.battery_percent > 0.0);
                assert!(report.watts > 0.0);
                assert!(report.battery_percent < previous_percent + 1.0);
                previous_percent = report.battery_percent;
            }
            TickOutcome::Depleted(report) => {
                depleted_at = Some(report.tick);
                break;
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    let depleted_at = depleted_at.expect("battery should deplete within the run");
    assert_eq!(engine.state(), EngineState::Depleted);
    assert!(matches!(engine.on_tick(60.0), Err(SimError::Depleted)));

    let last = sink.latest().expect("at least one snapshot");
    assert_eq!(last.tick, depleted_at);
    assert_eq!(last.len() as u64, depleted_at);
    assert!(last.latest().map(|(percent, _)| percent <= 0.0).unwrap_or(false));
    Ok(())
}

#[test]
fn playback_cycles_through_every_profile() -> anyhow::Result<()> {
    let profiles = load_workload_dataset(fixture())?;
    let cycle: usize = profiles.iter().map(|p| p.bin_ordering().len()).sum();
    let mut playlist = WorkloadPlaylist::new(profiles);

    let mut visited_profiles = Vec::new();
    for _ in 0..cycle {
        let (profile, _) = playlist.position();
        if visited_profiles.last() != Some(&profile) {
            visited_profiles.push(profile);
        }
        playlist.advance();
    }
    assert_eq!(visited_profiles, vec![0, 1]);
    assert_eq!(playlist.position(), (0, 0));
    Ok(())
}
