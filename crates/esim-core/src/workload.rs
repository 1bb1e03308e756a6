//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Workload profiles built from CPU utilization bins."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};

use crate::errors::{Result, SimError};
use crate::power_model::PowerModel;

pub type BinId = u32;

/// Utilization statistics captured for one segment of a workload timeline.
#[derive(Debug, Clone, Copy)]
pub struct CpuBin {
    distribution: Normal<f64>,
    sample_count: u64,
}

impl CpuBin {
    pub fn new(mean: f64, std_dev: f64, sample_count: u64) -> std::result::Result<Self, NormalError> {
        if !mean.is_finite() || !std_dev.is_finite() {
            return Err(NormalError::BadVariance);
        }
        Ok(Self {
            distribution: Normal::new(mean, std_dev)?,
            sample_count,
        })
    }

    pub fn mean(&self) -> f64 {
        self.distribution.mean()
    }

    pub fn std_dev(&self) -> f64 {
        self.distribution.std_dev()
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Draw a utilization, clamped to the physical 0-100 % range.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.distribution.sample(rng).clamp(0.0, 100.0)
    }
}

/// A named workload: its bins, the order they are visited in, and its power model.
#[derive(Debug, Clone)]
pub struct WorkloadProfile {
    name: String,
    bins: BTreeMap<BinId, CpuBin>,
    bin_ordering: Vec<BinId>,
    power_model: PowerModel,
}

impl WorkloadProfile {
    /// Build a profile, rejecting orderings that reference unknown bins.
    pub fn new(
        name: impl Into<String>,
        bins: BTreeMap<BinId, CpuBin>,
        bin_ordering: Vec<BinId>,
        power_model: PowerModel,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(missing) = bin_ordering.iter().find(|id| !bins.contains_key(id)) {
            return Err(SimError::configuration(
                format!("profile `{name}`"),
                format!("bin_ordering references unknown bin {missing}"),
            ));
        }
        Ok(Self {
            name,
            bins,
            bin_ordering,
            power_model,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bins(&self) -> &BTreeMap<BinId, CpuBin> {
        &self.bins
    }

    pub fn bin(&self, id: BinId) -> Option<&CpuBin> {
        self.bins.get(&id)
    }

    pub fn bin_ordering(&self) -> &[BinId] {
        &self.bin_ordering
    }

    pub fn power_model(&self) -> &PowerModel {
        &self.power_model
    }

    /// Profiles without bins or without an ordering contribute no load.
    pub fn has_workload(&self) -> bool {
        !self.bins.is_empty() && !self.bin_ordering.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_are_clamped_to_percentage_range() {
        let high = CpuBin::new(150.0, 1.0, 10).unwrap();
        let low = CpuBin::new(-40.0, 1.0, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..32 {
            assert_eq!(high.sample(&mut rng), 100.0);
            assert_eq!(low.sample(&mut rng), 0.0);
        }
    }

    #[test]
    fn rejects_unusable_statistics() {
        assert!(CpuBin::new(10.0, -1.0, 3).is_err());
        assert!(CpuBin::new(f64::NAN, 1.0, 3).is_err());
        let bin = CpuBin::new(35.0, 4.0, 12).unwrap();
        assert_eq!(bin.mean(), 35.0);
        assert_eq!(bin.std_dev(), 4.0);
        assert_eq!(bin.sample_count(), 12);
    }

    #[test]
    fn ordering_must_reference_known_bins() {
        let mut bins = BTreeMap::new();
        bins.insert(0, CpuBin::new(20.0, 2.0, 5).unwrap());
        let err = WorkloadProfile::new("pair-a", bins, vec![0, 3], PowerModel::constant(4.0))
            .expect_err("bin 3 is unknown");
        assert!(err.to_string().contains("unknown bin 3"));
    }

    #[test]
    fn empty_profiles_have_no_workload() {
        let profile =
            WorkloadProfile::new("idle", BTreeMap::new(), Vec::new(), PowerModel::constant(1.0))
                .unwrap();
        assert!(!profile.has_workload());
    }
}
