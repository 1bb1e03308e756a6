//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Shared primitives and utilities for the simulator runtime."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use tracing::debug;

use crate::logging::LogFormat;

fn default_nominal_capacity_mah() -> u32 {
    4000
}

fn default_voltage() -> f64 {
    12.6
}

fn default_simulation_seed() -> u64 {
    0x5EED_B0A7u64
}

fn default_noise_probability() -> f64 {
    1.0 / 11.0
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_drones() -> u32 {
    1
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for a simulator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and built-in defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "ESIM_CONFIG";

    /// Load configuration from disk, respecting the `ESIM_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// An `ESIM_CONFIG` path must exist. Candidate paths are probed in order and
    /// the first existing one wins; when none exists the defaults are returned.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found; using defaults"
        );
        Ok(LoadedAppConfig {
            config: Self::default(),
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.battery.validate()?;
        self.simulation.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Rated capacity applied when the first telemetry sample arrives.
    #[serde(default = "default_nominal_capacity_mah")]
    pub nominal_capacity_mah: u32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            nominal_capacity_mah: default_nominal_capacity_mah(),
        }
    }
}

impl BatteryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.nominal_capacity_mah == 0 {
            return Err(anyhow!("battery.nominal_capacity_mah must be greater than zero"));
        }
        Ok(())
    }
}

/// Where the simulated workload is executed. Informational only.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OffloadingMethod {
    #[default]
    #[serde(rename = "none")]
    #[value(name = "none")]
    Unspecified,
    Onboard,
    Partial,
    Full,
}

impl OffloadingMethod {
    /// Short machine-friendly label used in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            OffloadingMethod::Unspecified => "none",
            OffloadingMethod::Onboard => "onboard",
            OffloadingMethod::Partial => "partial",
            OffloadingMethod::Full => "full",
        }
    }
}

impl fmt::Display for OffloadingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffloadingMethod::Unspecified => f.write_str("Unspecified"),
            OffloadingMethod::Onboard => f.write_str("Onboard"),
            OffloadingMethod::Partial => f.write_str("Partial Offloading"),
            OffloadingMethod::Full => f.write_str("Full Offloading"),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Workload dataset (profile bins and regressions) in JSON.
    #[serde(default)]
    pub workload_path: Option<PathBuf>,
    #[serde(default = "default_simulation_seed")]
    pub random_seed: u64,
    /// Chance per tick that regression noise is added to the power draw.
    #[serde(default = "default_noise_probability")]
    pub noise_probability: f64,
    #[serde(default = "default_tick_interval")]
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub tick_interval: Duration,
    /// Stop each drone after this many heartbeats even if not depleted.
    #[serde(default)]
    pub max_ticks: Option<u64>,
    #[serde(default)]
    pub offloading_method: OffloadingMethod,
    #[serde(default = "default_drones")]
    pub drones: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workload_path: None,
            random_seed: default_simulation_seed(),
            noise_probability: default_noise_probability(),
            tick_interval: default_tick_interval(),
            max_ticks: None,
            offloading_method: OffloadingMethod::default(),
            drones: default_drones(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.noise_probability) {
            return Err(anyhow!(
                "simulation.noise_probability must lie within [0, 1], got {}",
                self.noise_probability
            ));
        }
        if self.tick_interval.is_zero() {
            return Err(anyhow!("simulation.tick_interval must be greater than zero"));
        }
        if self.drones == 0 {
            return Err(anyhow!("simulation.drones must be at least 1"));
        }
        Ok(())
    }

    /// Seed for a single drone so that fleet members draw independent streams.
    pub fn seed_for_drone(&self, drone_idx: u32) -> u64 {
        self.random_seed.wrapping_add(u64::from(drone_idx))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_voltage")]
    pub voltage: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub level: Option<f64>,
    /// Replay telemetry samples from a JSON or CSV file instead of the constants.
    #[serde(default)]
    pub replay_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            voltage: default_voltage(),
            current: 0.0,
            level: None,
            replay_file: None,
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.voltage.is_finite() || self.voltage <= 0.0 {
            return Err(anyhow!(
                "telemetry.voltage must be a positive number, got {}",
                self.voltage
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one CSV series per drone. Disabled when unset.
    #[serde(default)]
    pub series_directory: Option<PathBuf>,
}
