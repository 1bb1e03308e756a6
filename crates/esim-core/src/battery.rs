//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Battery energy bookkeeping in Joules."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SimError};
use crate::frames::TelemetrySample;

/// Seconds per hour divided by milliamps per amp.
const MILLIAMP_HOUR_TO_COULOMB: f64 = 3.6;

/// `V * mAh * 3.6`, the energy stored by a pack of the given charge at `voltage`.
pub fn milliamp_hours_to_joules(voltage: f64, milliamp_hours: u32) -> f64 {
    voltage * f64::from(milliamp_hours) * MILLIAMP_HOUR_TO_COULOMB
}

/// Remaining and maximum battery energy plus the last reported electrical readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    pub voltage: f64,
    pub current: f64,
    pub level: Option<f64>,
    capacity_joules: f64,
    max_capacity_joules: f64,
}

impl BatteryState {
    /// New state with no capacity yet; the percentage is unavailable until one is set.
    pub fn from_telemetry(sample: &TelemetrySample) -> Self {
        Self {
            voltage: sample.voltage,
            current: sample.current,
            level: sample.level,
            capacity_joules: 0.0,
            max_capacity_joules: 0.0,
        }
    }

    pub fn capacity_joules(&self) -> f64 {
        self.capacity_joules
    }

    pub fn max_capacity_joules(&self) -> f64 {
        self.max_capacity_joules
    }

    /// Set the remaining energy. The maximum only ever ratchets upward.
    pub fn set_capacity_joules(&mut self, joules: f64) {
        self.capacity_joules = joules;
        self.max_capacity_joules = self.max_capacity_joules.max(joules);
    }

    pub fn set_capacity_from_milliamp_hours(&mut self, voltage: f64, milliamp_hours: u32) {
        self.set_capacity_joules(milliamp_hours_to_joules(voltage, milliamp_hours));
    }

    /// Remaining energy as a fraction of the high-water mark, in `[.., 1.0]`.
    pub fn capacity_percentage(&self) -> Result<f64> {
        if self.max_capacity_joules <= 0.0 {
            return Err(SimError::UninitializedState);
        }
        Ok(self.capacity_joules / self.max_capacity_joules)
    }

    /// Copy electrical readings without touching the stored energy.
    pub fn refresh_telemetry(&mut self, sample: &TelemetrySample) {
        self.voltage = sample.voltage;
        self.current = sample.current;
        self.level = sample.level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn battery() -> BatteryState {
        BatteryState::from_telemetry(&TelemetrySample::new(12.6, 0.4, Some(0.97)))
    }

    #[test]
    fn converts_milliamp_hours_with_voltage() {
        assert_relative_eq!(milliamp_hours_to_joules(12.6, 1000), 45_360.0, epsilon = 1e-9);
        assert_relative_eq!(milliamp_hours_to_joules(12.6, 4000), 181_440.0, epsilon = 1e-9);
        assert_eq!(milliamp_hours_to_joules(11.1, 0), 0.0);
    }

    #[test]
    fn fresh_capacity_reports_full_charge() {
        let mut state = battery();
        state.set_capacity_from_milliamp_hours(12.6, 1000);
        assert_relative_eq!(state.capacity_joules(), 45_360.0, epsilon = 1e-9);
        assert_relative_eq!(state.max_capacity_joules(), 45_360.0, epsilon = 1e-9);
        assert_relative_eq!(state.capacity_percentage().unwrap(), 1.0);
    }

    #[test]
    fn percentage_requires_a_capacity() {
        let state = battery();
        assert!(matches!(
            state.capacity_percentage(),
            Err(SimError::UninitializedState)
        ));
    }

    #[test]
    fn maximum_is_a_high_water_mark() {
        let mut state = battery();
        state.set_capacity_joules(100.0);
        state.set_capacity_joules(40.0);
        assert_eq!(state.max_capacity_joules(), 100.0);
        assert_relative_eq!(state.capacity_percentage().unwrap(), 0.4);
        state.set_capacity_joules(250.0);
        assert_eq!(state.max_capacity_joules(), 250.0);
        assert!(state.capacity_joules() <= state.max_capacity_joules());
    }

    #[test]
    fn capacity_may_cross_zero() {
        let mut state = battery();
        state.set_capacity_joules(10.0);
        state.set_capacity_joules(state.capacity_joules() - 12.5);
        assert_relative_eq!(state.capacity_joules(), -2.5);
        assert!(state.capacity_percentage().unwrap() < 0.0);
    }

    #[test]
    fn telemetry_refresh_keeps_energy() {
        let mut state = battery();
        state.set_capacity_joules(80.0);
        state.refresh_telemetry(&TelemetrySample::new(11.9, 2.1, None));
        assert_eq!(state.voltage, 11.9);
        assert_eq!(state.current, 2.1);
        assert_eq!(state.level, None);
        assert_eq!(state.capacity_joules(), 80.0);
    }
}
