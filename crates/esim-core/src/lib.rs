//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Simulation engine module exports and shared types."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
//! Energy-consumption simulation engine.
//!
//! A [`SimulationEngine`] is advanced once per heartbeat. Each step samples a CPU
//! utilization from the active [`WorkloadPlaylist`] bin, converts it to a power
//! draw through the profile's [`PowerModel`], integrates the energy over the
//! measured elapsed time into the [`BatteryState`], and publishes the accumulated
//! series to a [`SeriesSink`].

pub mod battery;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod frames;
pub mod playlist;
pub mod power_model;
pub mod sink;
pub mod workload;

pub use battery::{milliamp_hours_to_joules, BatteryState};
pub use dataset::{load_workload_dataset, parse_workload_dataset};
pub use engine::{
    EngineSettings, EngineState, SimulationEngine, StepReport, TickOutcome,
    DEFAULT_NOMINAL_CAPACITY_MAH,
};
pub use errors::{PowerModelError, Result, SimError};
pub use frames::{SeriesSnapshot, TelemetrySample};
pub use playlist::WorkloadPlaylist;
pub use power_model::{NoiseTrigger, PowerModel, UTILIZATION_BUCKETS};
pub use sink::{ChannelSink, MemorySink, NullSink, SeriesSink, SinkError};
pub use workload::{BinId, CpuBin, WorkloadProfile};
