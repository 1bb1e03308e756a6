//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Workload dataset loading and validation."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
//! JSON workload datasets.
//!
//! A dataset maps profile names to `{cpu_bins, bin_ordering, regression}`.
//! Validation is all-or-nothing: the first malformed profile rejects the file
//! and no profile from it is returned.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{Result, SimError};
use crate::power_model::PowerModel;
use crate::workload::{BinId, CpuBin, WorkloadProfile};

#[derive(Debug, Deserialize)]
struct RawProfile {
    cpu_bins: IndexMap<String, RawBin>,
    bin_ordering: Vec<RawBinId>,
    regression: RawRegression,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBin {
    mean: f64,
    std: f64,
    n: u64,
}

#[derive(Debug, Deserialize)]
struct RawRegression {
    coefs: Vec<f64>,
    poly_stds: Vec<f64>,
    r_2: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBinId {
    Number(BinId),
    Text(String),
}

impl RawBinId {
    fn resolve(&self) -> std::result::Result<BinId, String> {
        match self {
            RawBinId::Number(id) => Ok(*id),
            RawBinId::Text(text) => parse_bin_key(text),
        }
    }
}

fn parse_bin_key(key: &str) -> std::result::Result<BinId, String> {
    if key.is_empty() || !key.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(format!("bin id `{key}` is not numeric"));
    }
    key.parse::<BinId>()
        .map_err(|err| format!("bin id `{key}` is out of range: {err}"))
}

/// Parse and validate a dataset held in memory.
pub fn parse_workload_dataset(raw: &str) -> Result<Vec<WorkloadProfile>> {
    let document: IndexMap<String, Value> =
        serde_json::from_str(raw).map_err(|err| SimError::configuration("dataset", err))?;

    let mut profiles = Vec::with_capacity(document.len());
    for (name, value) in document {
        let profile = build_profile(&name, value)?;
        debug!(
            profile = %name,
            bins = profile.bins().len(),
            ordering = profile.bin_ordering().len(),
            "workload profile validated"
        );
        profiles.push(profile);
    }
    Ok(profiles)
}

/// Read a dataset from disk. See [`parse_workload_dataset`].
pub fn load_workload_dataset(path: impl AsRef<Path>) -> Result<Vec<WorkloadProfile>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| SimError::DatasetIo {
        path: path.to_path_buf(),
        source,
    })?;
    let profiles = parse_workload_dataset(&raw)?;
    info!(
        path = %path.display(),
        profiles = profiles.len(),
        "workload dataset loaded"
    );
    Ok(profiles)
}

fn build_profile(name: &str, value: Value) -> Result<WorkloadProfile> {
    let context = || format!("profile `{name}`");
    let raw: RawProfile =
        serde_json::from_value(value).map_err(|err| SimError::configuration(context(), err))?;

    let mut bins = BTreeMap::new();
    for (key, bin) in raw.cpu_bins {
        let id = parse_bin_key(&key).map_err(|reason| SimError::configuration(context(), reason))?;
        let cpu_bin = CpuBin::new(bin.mean, bin.std, bin.n).map_err(|err| {
            SimError::configuration(context(), format!("bin {id} has unusable statistics: {err}"))
        })?;
        bins.insert(id, cpu_bin);
    }

    let ordering = raw
        .bin_ordering
        .iter()
        .map(RawBinId::resolve)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|reason| SimError::configuration(context(), reason))?;

    let model = PowerModel::new(raw.regression.coefs, raw.regression.poly_stds)
        .with_r_squared(raw.regression.r_2);

    WorkloadProfile::new(name, bins, ordering, model)
}
