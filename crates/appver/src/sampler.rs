// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Deterministic device cohorting for percentage rollouts
//!
//! A device is a rollout candidate when the first byte of the SHA-256 of its
//! id is below the threshold. With the default threshold of 128 roughly half of
//! all devices are candidates, whatever percentage is requested, so requests
//! above ~50% can select fewer devices than asked for.

use sha2::{Digest, Sha256};

pub const DEFAULT_CANDIDATE_THRESHOLD: u8 = 128;

/// Number of devices a percentage rollout aims for, rounded down
pub fn target_count(device_count: usize, percentage: u32) -> usize {
    let scaled = device_count as u128 * u128::from(percentage) / 100;
    usize::try_from(scaled).unwrap_or(usize::MAX)
}

#[derive(Debug, Clone, Copy)]
pub struct DeterministicSampler {
    threshold: u8,
}

impl Default for DeterministicSampler {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_THRESHOLD)
    }
}

impl DeterministicSampler {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Stable score in 0..=255 derived from the device id
    pub fn score(device_id: &str) -> u8 {
        Sha256::digest(device_id.as_bytes())[0]
    }

    pub fn is_candidate(&self, device_id: &str) -> bool {
        Self::score(device_id) < self.threshold
    }

    /// Candidates in input order, capped at [`target_count`]
    pub fn select_for_percentage<'a, D: AsRef<str>>(
        &self,
        device_ids: &'a [D],
        percentage: u32,
    ) -> Vec<&'a str> {
        let target = target_count(device_ids.len(), percentage);
        device_ids
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|id| self.is_candidate(id))
            .take(target)
            .collect()
    }
}
