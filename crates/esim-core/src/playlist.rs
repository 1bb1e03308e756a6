//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Cyclic playback cursor over workload profiles."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use rand::Rng;

use crate::errors::{Result, SimError};
use crate::power_model::PowerModel;
use crate::workload::{CpuBin, WorkloadProfile};

/// Ordered profiles replayed bin by bin, wrapping forever.
#[derive(Debug, Clone, Default)]
pub struct WorkloadPlaylist {
    profiles: Vec<WorkloadProfile>,
    profile_cursor: usize,
    bin_cursor: usize,
}

impl WorkloadPlaylist {
    pub fn new(profiles: Vec<WorkloadProfile>) -> Self {
        Self {
            profiles,
            profile_cursor: 0,
            bin_cursor: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn profiles(&self) -> &[WorkloadProfile] {
        &self.profiles
    }

    /// `(profile_cursor, bin_cursor)`.
    pub fn position(&self) -> (usize, usize) {
        (self.profile_cursor, self.bin_cursor)
    }

    pub fn active_profile(&self) -> Option<&WorkloadProfile> {
        self.profiles.get(self.profile_cursor)
    }

    /// Bin under the cursor, `None` for an empty playlist or a profile without workload.
    pub fn current_bin(&self) -> Result<Option<&CpuBin>> {
        let Some(profile) = self.active_profile() else {
            return Ok(None);
        };
        if !profile.has_workload() {
            return Ok(None);
        }
        let out_of_range = || SimError::CursorOutOfRange {
            profile: self.profile_cursor,
            bin: self.bin_cursor,
        };
        let id = profile
            .bin_ordering()
            .get(self.bin_cursor)
            .ok_or_else(out_of_range)?;
        profile.bin(*id).map(Some).ok_or_else(out_of_range)
    }

    /// Draw a utilization from the current bin; 0 when there is no workload.
    pub fn sample_current_utilization<R: Rng>(&self, rng: &mut R) -> Result<f64> {
        Ok(self
            .current_bin()?
            .map(|bin| bin.sample(rng))
            .unwrap_or(0.0))
    }

    pub fn current_power_model(&self) -> Option<&PowerModel> {
        self.active_profile().map(WorkloadProfile::power_model)
    }

    /// Step to the next bin, rolling over into the next profile and back to the first.
    pub fn advance(&mut self) {
        let Some(ordering_len) = self
            .active_profile()
            .map(|profile| profile.bin_ordering().len())
        else {
            return;
        };
        self.bin_cursor += 1;
        if self.bin_cursor >= ordering_len {
            self.bin_cursor = 0;
            self.profile_cursor += 1;
            if self.profile_cursor >= self.profiles.len() {
                self.profile_cursor = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn profile(name: &str, ordering: Vec<u32>) -> WorkloadProfile {
        let mut bins = BTreeMap::new();
        for id in &ordering {
            bins.insert(*id, CpuBin::new(f64::from(*id) * 10.0, 0.0, 3).unwrap());
        }
        WorkloadProfile::new(name, bins, ordering, PowerModel::constant(5.0)).unwrap()
    }

    #[test]
    fn empty_playlist_samples_zero() {
        let mut playlist = WorkloadPlaylist::empty();
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(playlist.sample_current_utilization(&mut rng).unwrap(), 0.0);
        assert!(playlist.current_power_model().is_none());
        playlist.advance();
        assert_eq!(playlist.position(), (0, 0));
    }

    #[test]
    fn full_cycle_returns_cursor_to_origin() {
        let mut playlist = WorkloadPlaylist::new(vec![
            profile("a", vec![1, 2, 3]),
            profile("b", vec![4, 5, 6]),
            profile("c", vec![7, 8, 9]),
        ]);
        for _ in 0..3 * 3 {
            playlist.advance();
        }
        assert_eq!(playlist.position(), (0, 0));
    }

    #[test]
    fn advance_rolls_into_next_profile() {
        let mut playlist =
            WorkloadPlaylist::new(vec![profile("a", vec![1, 2]), profile("b", vec![3])]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push((
                playlist.position(),
                playlist.sample_current_utilization(&mut rng).unwrap(),
            ));
            playlist.advance();
        }
        assert_eq!(
            seen,
            vec![
                ((0, 0), 10.0),
                ((0, 1), 20.0),
                ((1, 0), 30.0),
                ((0, 0), 10.0),
                ((0, 1), 20.0),
                ((1, 0), 30.0),
            ]
        );
    }

    #[test]
    fn repeated_bin_ids_are_replayed() {
        let mut bins = BTreeMap::new();
        bins.insert(0, CpuBin::new(15.0, 0.0, 1).unwrap());
        bins.insert(1, CpuBin::new(80.0, 0.0, 1).unwrap());
        let looped =
            WorkloadProfile::new("loop", bins, vec![0, 1, 1, 0], PowerModel::constant(1.0))
                .unwrap();
        let mut playlist = WorkloadPlaylist::new(vec![looped]);
        let mut rng = StdRng::seed_from_u64(2);
        let draws: Vec<f64> = (0..4)
            .map(|_| {
                let value = playlist.sample_current_utilization(&mut rng).unwrap();
                playlist.advance();
                value
            })
            .collect();
        assert_eq!(draws, vec![15.0, 80.0, 80.0, 15.0]);
    }

    #[test]
    fn cursor_never_leaves_valid_range() {
        let mut playlist = WorkloadPlaylist::new(vec![
            profile("a", vec![1, 2, 3, 4, 5]),
            profile("idle", Vec::new()),
            profile("c", vec![6]),
            profile("d", vec![7, 8]),
        ]);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..1_000 {
            let (profile_cursor, bin_cursor) = playlist.position();
            assert!(profile_cursor < playlist.len());
            let ordering = playlist.profiles()[profile_cursor].bin_ordering().len();
            assert!(bin_cursor < ordering.max(1));
            assert!(playlist.current_bin().is_ok());
            assert!(playlist.sample_current_utilization(&mut rng).is_ok());
            playlist.advance();
        }
    }

    #[test]
    fn degenerate_profiles_sample_zero_and_still_advance() {
        let mut playlist =
            WorkloadPlaylist::new(vec![profile("idle", Vec::new()), profile("b", vec![2])]);
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(playlist.sample_current_utilization(&mut rng).unwrap(), 0.0);
        assert!(playlist.current_power_model().is_some());
        playlist.advance();
        assert_eq!(playlist.position(), (1, 0));
        assert_eq!(playlist.sample_current_utilization(&mut rng).unwrap(), 20.0);
    }
}
