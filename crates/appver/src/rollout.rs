// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Strategy-based release of a version to a set of devices
//!
//! A version starts out `Uploaded` and becomes `PartiallyReleased` on its first
//! release. Releases are cumulative: every further release appends to the
//! version's released devices, and there is no rolled back state.

use crate::error::{Result, VersionError};
use crate::registry::{Registry, VersionRecord};
use crate::sampler::{DeterministicSampler, target_count};
use crate::telemetry::{progress_bar, progress_percent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloutStrategy {
    /// Every listed device receives the version
    Beta,
    /// A deterministic hash-selected share of the listed devices
    Percentage,
}

impl RolloutStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::Percentage => "percentage",
        }
    }

    pub fn all() -> &'static [RolloutStrategy] {
        &[Self::Beta, Self::Percentage]
    }
}

impl fmt::Display for RolloutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RolloutStrategy {
    type Err = VersionError;

    /// Exact match on the strategy name
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "beta" => Ok(Self::Beta),
            "percentage" => Ok(Self::Percentage),
            _ => Err(VersionError::UnknownStrategy(s.to_owned())),
        }
    }
}

/// Where a version is in its release lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RolloutStage {
    Uploaded,
    PartiallyReleased {
        /// Entries in the released device list, duplicates included
        devices: usize,
    },
}

impl RolloutStage {
    pub fn of(record: &VersionRecord) -> Self {
        match record.released_devices.len() {
            0 => Self::Uploaded,
            devices => Self::PartiallyReleased { devices },
        }
    }
}

/// Device id to the version most recently released to it
#[derive(Debug, Clone, Default)]
pub struct RolloutAssignments {
    by_device: HashMap<String, String>,
}

impl RolloutAssignments {
    pub fn get(&self, device_id: &str) -> Option<&str> {
        self.by_device.get(device_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_device.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_device
            .iter()
            .map(|(device, version)| (device.as_str(), version.as_str()))
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.by_device.clone()
    }

    fn assign(&mut self, device_id: &str, version_id: &str) {
        self.by_device
            .insert(device_id.to_owned(), version_id.to_owned());
    }
}

/// Outcome of a successful release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolloutReport {
    pub app: String,
    pub version: String,
    pub strategy: RolloutStrategy,
    /// Devices passed in by the caller
    pub requested: usize,
    /// Devices the strategy aimed for
    pub target: usize,
    /// Devices that received the version, in release order
    pub released: Vec<String>,
}

impl RolloutReport {
    /// True when fewer devices were released than targeted
    pub fn is_short(&self) -> bool {
        self.released.len() < self.target
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutEngine {
    sampler: DeterministicSampler,
    progress_logging: bool,
}

impl RolloutEngine {
    pub fn new(sampler: DeterministicSampler, progress_logging: bool) -> Self {
        Self {
            sampler,
            progress_logging,
        }
    }

    pub fn sampler(&self) -> &DeterministicSampler {
        &self.sampler
    }

    /// Release `version_id` of `app_name` to devices chosen by `strategy`.
    ///
    /// Lookups and strategy parsing happen before anything is written, so a
    /// failed release leaves registry and assignments untouched.
    #[expect(clippy::too_many_arguments)]
    pub fn release<D: AsRef<str>>(
        &self,
        registry: &mut Registry,
        assignments: &mut RolloutAssignments,
        app_name: &str,
        version_id: &str,
        strategy: &str,
        percentage: u32,
        device_ids: &[D],
    ) -> Result<RolloutReport> {
        registry.get_version(app_name, version_id)?;
        let strategy: RolloutStrategy = strategy.parse()?;

        let (target, selected): (usize, Vec<&str>) = match strategy {
            RolloutStrategy::Beta => (
                device_ids.len(),
                device_ids.iter().map(AsRef::<str>::as_ref).collect(),
            ),
            RolloutStrategy::Percentage => (
                target_count(device_ids.len(), percentage),
                self.sampler.select_for_percentage(device_ids, percentage),
            ),
        };

        let record = registry.version_mut(app_name, version_id)?;
        for (i, device_id) in selected.iter().enumerate() {
            assignments.assign(device_id, version_id);
            record.released_devices.push((*device_id).to_owned());

            if self.progress_logging {
                let progress = progress_percent(i + 1, selected.len());
                debug!(
                    "Rolling out {version_id} ({strategy}): [{}] {progress:.2}% -> Device: {device_id}",
                    progress_bar(progress)
                );
            }
        }

        info!(
            "{strategy} rollout: version {version_id} of app {app_name} released to {} of {} devices",
            selected.len(),
            device_ids.len()
        );

        Ok(RolloutReport {
            app: app_name.to_owned(),
            version: version_id.to_owned(),
            strategy,
            requested: device_ids.len(),
            target,
            released: selected.into_iter().map(str::to_owned).collect(),
        })
    }
}
