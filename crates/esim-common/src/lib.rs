//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Shared primitives and utilities for the simulator runtime."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
//! Shared primitives for the esim workspace.
//! This crate exposes configuration loading, tracing setup, and tick timing
//! utilities consumed by the engine hosts and the daemon.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod time;

pub use config::{
    AppConfig, BatteryConfig, LoadedAppConfig, LoggingConfig, OffloadingMethod, OutputConfig,
    SimulationConfig, TelemetryConfig,
};
pub use logging::{drone_span, init_tracing, LogFormat};
pub use metrics::{JitterSummary, LoopTimingReporter};
