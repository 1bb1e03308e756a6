//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Session orchestration and lifecycle management."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
//! Drives one simulation engine per drone from a heartbeat, feeds it telemetry,
//! and records the resulting battery series.

pub mod recorder;
pub mod replay;
pub mod session;
pub mod telemetry;

pub use recorder::{series_file_name, write_series_csv, RunSummary, SeriesRecorder};
pub use replay::TelemetryReplay;
pub use session::{SessionHandle, SimulationSession};
pub use telemetry::{build_telemetry_source, StaticTelemetry, TelemetryReading, TelemetrySource};
