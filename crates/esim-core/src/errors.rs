//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Error taxonomy for the simulation engine."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed workload data. Nothing from the offending dataset is registered.
    #[error("workload configuration error in {context}: {reason}")]
    Configuration { context: String, reason: String },
    #[error("unable to read workload dataset {path}: {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("battery capacity percentage requested before any capacity was set")]
    UninitializedState,
    #[error("playlist cursor (profile {profile}, bin {bin}) points outside the loaded workload")]
    CursorOutOfRange { profile: usize, bin: usize },
    #[error("battery depleted; the simulation no longer accepts ticks")]
    Depleted,
    #[error("elapsed time must be finite and non-negative, got {0}")]
    InvalidElapsed(f64),
    #[error("noise trigger probability must lie within [0, 1], got {0}")]
    InvalidProbability(f64),
}

impl SimError {
    pub(crate) fn configuration(context: impl Into<String>, reason: impl ToString) -> Self {
        SimError::Configuration {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Reasons a regression cannot produce a draw for a given utilization.
///
/// The engine absorbs these as a zero-watt tick.
#[derive(Debug, Error, PartialEq)]
pub enum PowerModelError {
    #[error("utilization {0} outside [0, 100]")]
    UtilizationOutOfRange(f64),
    #[error("regression has no coefficients")]
    NoCoefficients,
    #[error("regression has no standard deviation for utilization bucket {0}")]
    MissingStdDev(usize),
    #[error("regression standard deviation {std_dev} for bucket {bucket} is not usable")]
    InvalidStdDev { bucket: usize, std_dev: f64 },
}
