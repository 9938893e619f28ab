// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Version registry: applications and their immutable version records

use crate::error::{Result, VersionError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// A single uploaded version of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    /// Opaque version identifier (e.g., "v2.0")
    pub version_id: String,

    /// Lowest device OS version this build runs on (e.g., "Android-10")
    pub min_os_version: String,

    /// Installable artifact
    #[serde(skip)]
    pub content: Vec<u8>,

    /// Informational only
    pub is_beta: bool,

    /// Devices this version was released to, in release order.
    /// Repeated rollouts may list a device more than once.
    pub released_devices: Vec<String>,

    pub uploaded_at: DateTime<Utc>,
}

/// An application and all versions uploaded for it
#[derive(Debug, Clone, Default)]
pub struct Application {
    pub name: String,
    versions: HashMap<String, VersionRecord>,
}

impl Application {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            versions: HashMap::new(),
        }
    }

    pub fn version(&self, version_id: &str) -> Option<&VersionRecord> {
        self.versions.get(version_id)
    }

    /// All versions, in no particular order
    pub fn versions(&self) -> impl Iterator<Item = &VersionRecord> {
        self.versions.values()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// In-memory store of applications keyed by name.
///
/// Applications are created lazily on first upload and never removed. A
/// version record only changes through [`Registry::version_mut`], which the
/// rollout engine uses to append released devices.
#[derive(Debug, Default)]
pub struct Registry {
    apps: HashMap<String, Application>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `version_id` for `app_name`.
    ///
    /// Re-uploading an existing id replaces content and flags and starts the
    /// released device list over.
    pub fn upload_version(
        &mut self,
        app_name: &str,
        version_id: &str,
        min_os_version: &str,
        content: Vec<u8>,
        is_beta: bool,
    ) -> Result<&VersionRecord> {
        if app_name.is_empty() {
            return Err(VersionError::InvalidInput(
                "app name must not be empty".to_owned(),
            ));
        }
        if version_id.is_empty() {
            return Err(VersionError::InvalidInput(
                "version id must not be empty".to_owned(),
            ));
        }

        let app = self
            .apps
            .entry(app_name.to_owned())
            .or_insert_with(|| Application::new(app_name));

        let record = VersionRecord {
            version_id: version_id.to_owned(),
            min_os_version: min_os_version.to_owned(),
            content,
            is_beta,
            released_devices: Vec::new(),
            uploaded_at: Utc::now(),
        };

        if app.versions.insert(version_id.to_owned(), record).is_some() {
            debug!("Overwrote version {version_id} of app {app_name}");
        }

        self.get_version(app_name, version_id)
    }

    pub fn app(&self, app_name: &str) -> Result<&Application> {
        self.apps
            .get(app_name)
            .ok_or_else(|| VersionError::AppNotFound(app_name.to_owned()))
    }

    pub fn contains_app(&self, app_name: &str) -> bool {
        self.apps.contains_key(app_name)
    }

    pub fn app_names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn get_version(&self, app_name: &str, version_id: &str) -> Result<&VersionRecord> {
        self.app(app_name)?
            .version(version_id)
            .ok_or_else(|| VersionError::version_not_found(app_name, version_id))
    }

    /// Lazily iterate the versions of `app_name`; unknown apps yield nothing
    pub fn list_versions(&self, app_name: &str) -> impl Iterator<Item = &VersionRecord> {
        self.apps
            .get(app_name)
            .into_iter()
            .flat_map(Application::versions)
    }

    pub(crate) fn version_mut(
        &mut self,
        app_name: &str,
        version_id: &str,
    ) -> Result<&mut VersionRecord> {
        self.apps
            .get_mut(app_name)
            .ok_or_else(|| VersionError::AppNotFound(app_name.to_owned()))?
            .versions
            .get_mut(version_id)
            .ok_or_else(|| VersionError::version_not_found(app_name, version_id))
    }
}
