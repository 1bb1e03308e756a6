//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Regression based power draw model."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::{PowerModelError, Result, SimError};

/// Number of integer utilization buckets carrying a noise standard deviation.
pub const UTILIZATION_BUCKETS: usize = 100;

/// Polynomial regression from CPU utilization (0-100 %) to power draw in Watts.
///
/// Coefficients are ordered highest degree first, so `[a, b, c]` evaluates as
/// `a*u^2 + b*u + c`. Each integer utilization bucket carries the residual
/// standard deviation observed on hardware, re-applied as optional noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerModel {
    coefficients: Vec<f64>,
    std_dev_by_bucket: Vec<f64>,
    #[serde(default)]
    r_squared: Option<f64>,
}

impl PowerModel {
    pub fn new(coefficients: Vec<f64>, std_dev_by_bucket: Vec<f64>) -> Self {
        Self {
            coefficients,
            std_dev_by_bucket,
            r_squared: None,
        }
    }

    /// Attach the goodness of fit reported with the regression.
    pub fn with_r_squared(mut self, r_squared: f64) -> Self {
        self.r_squared = Some(r_squared);
        self
    }

    /// Model drawing a constant power regardless of utilization, without noise.
    pub fn constant(watts: f64) -> Self {
        Self::new(vec![watts], vec![0.0; UTILIZATION_BUCKETS])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn std_dev_by_bucket(&self) -> &[f64] {
        &self.std_dev_by_bucket
    }

    pub fn r_squared(&self) -> Option<f64> {
        self.r_squared
    }

    /// Expected draw from the regression alone.
    pub fn expected(&self, utilization: f64) -> std::result::Result<f64, PowerModelError> {
        check_utilization(utilization)?;
        if self.coefficients.is_empty() {
            return Err(PowerModelError::NoCoefficients);
        }
        Ok(self
            .coefficients
            .iter()
            .fold(0.0, |acc, coefficient| acc * utilization + coefficient))
    }

    /// Draw the regression noise for the bucket containing `utilization`.
    pub fn noise<R: Rng>(
        &self,
        utilization: f64,
        rng: &mut R,
    ) -> std::result::Result<f64, PowerModelError> {
        check_utilization(utilization)?;
        let bucket = bucket_for(utilization);
        let std_dev = *self
            .std_dev_by_bucket
            .get(bucket)
            .ok_or(PowerModelError::MissingStdDev(bucket))?;
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(PowerModelError::InvalidStdDev { bucket, std_dev });
        }
        let normal = Normal::new(0.0, std_dev)
            .map_err(|_| PowerModelError::InvalidStdDev { bucket, std_dev })?;
        Ok(normal.sample(rng))
    }

    /// Power draw in Watts, optionally perturbed by the bucket noise.
    pub fn evaluate<R: Rng>(
        &self,
        utilization: f64,
        sample_noise: bool,
        rng: &mut R,
    ) -> std::result::Result<f64, PowerModelError> {
        let expected = self.expected(utilization)?;
        if !sample_noise {
            return Ok(expected);
        }
        let noise = self.noise(utilization, rng)?;
        trace!(
            expected_w = expected,
            noise_w = noise,
            total_w = expected + noise,
            "regression noise applied"
        );
        Ok(expected + noise)
    }
}

fn check_utilization(utilization: f64) -> std::result::Result<(), PowerModelError> {
    if (0.0..=100.0).contains(&utilization) {
        Ok(())
    } else {
        Err(PowerModelError::UtilizationOutOfRange(utilization))
    }
}

/// 100 % shares the last bucket with 99.x %.
fn bucket_for(utilization: f64) -> usize {
    (utilization.floor() as usize).min(UTILIZATION_BUCKETS - 1)
}

/// Decides per tick whether the regression noise is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseTrigger {
    probability: f64,
}

impl NoiseTrigger {
    /// One tick in eleven, matching the reference workload captures.
    pub const DEFAULT_PROBABILITY: f64 = 1.0 / 11.0;

    pub fn new(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::InvalidProbability(probability));
        }
        Ok(Self { probability })
    }

    pub fn never() -> Self {
        Self { probability: 0.0 }
    }

    pub fn always() -> Self {
        Self { probability: 1.0 }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn fire<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.probability)
    }
}

impl Default for NoiseTrigger {
    fn default() -> Self {
        Self {
            probability: Self::DEFAULT_PROBABILITY,
        }
    }
}
