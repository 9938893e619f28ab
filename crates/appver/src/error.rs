// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Error types for the appver crate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("app not found: {0}")]
    AppNotFound(String),

    #[error("version {version} not found for app {app}")]
    VersionNotFound { app: String, version: String },

    #[error("unknown rollout strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VersionError {
    pub(crate) fn version_not_found(app: &str, version: &str) -> Self {
        Self::VersionNotFound {
            app: app.to_owned(),
            version: version.to_owned(),
        }
    }

    /// True for the lookup failures (`AppNotFound`, `VersionNotFound`)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AppNotFound(_) | Self::VersionNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, VersionError>;
