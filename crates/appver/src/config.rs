// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Configuration module for the version manager

use crate::compat::VersionOrdering;
use crate::error::{Result, VersionError};
use crate::sampler::DEFAULT_CANDIDATE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

fn default_threshold() -> u8 {
    DEFAULT_CANDIDATE_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Devices whose first hash byte is below this value are percentage
    /// rollout candidates. Independent of the requested percentage.
    #[serde(default = "default_threshold")]
    pub candidate_threshold: u8,

    /// Ordering used for version ids and OS versions
    #[serde(default)]
    pub version_ordering: VersionOrdering,

    /// Emit a debug event with a progress bar for every released device
    #[serde(default = "default_true")]
    pub progress_logging: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            candidate_threshold: DEFAULT_CANDIDATE_THRESHOLD,
            version_ordering: VersionOrdering::default(),
            progress_logging: true,
        }
    }
}

/// Load config from `path`, falling back to defaults if the file is absent
pub fn load_config(path: &Path) -> Result<ManagerConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| VersionError::Config(format!("Failed to parse config: {e}")))
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        Ok(ManagerConfig::default())
    }
}

pub fn save_config(path: &Path, config: &ManagerConfig) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let content = serde_json::to_string_pretty(config)?;

    // Atomic write
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    Ok(())
}
