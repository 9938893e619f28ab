// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Version manager: the synchronized entry point for uploads, update and
//! install checks, patches and rollouts.
//!
//! All registry and assignment state lives behind one mutex. Each public
//! operation holds the guard for its whole read-modify-write sequence, so two
//! rollouts over overlapping devices, or an upload racing a rollout, never
//! lose updates. Collaborators (patch generator, installer) are only called
//! after the guard is dropped.

use crate::collaborators::{ConcatPatch, Installer, PatchGenerator};
use crate::compat::CompatibilityEvaluator;
use crate::config::ManagerConfig;
use crate::error::Result;
use crate::registry::{Registry, VersionRecord};
use crate::rollout::{RolloutAssignments, RolloutEngine, RolloutReport, RolloutStage};
use crate::sampler::DeterministicSampler;
use crate::telemetry::{RolloutEvent, report_event};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ManagerState {
    registry: Registry,
    assignments: RolloutAssignments,
}

#[derive(Debug)]
pub struct VersionManager {
    state: Mutex<ManagerState>,
    evaluator: CompatibilityEvaluator,
    engine: RolloutEngine,
    patch_generator: Arc<dyn PatchGenerator>,
}

impl Default for VersionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionManager {
    pub fn new() -> Self {
        Self::with_config(&ManagerConfig::default())
    }

    pub fn with_config(config: &ManagerConfig) -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
            evaluator: CompatibilityEvaluator::new(config.version_ordering),
            engine: RolloutEngine::new(
                DeterministicSampler::new(config.candidate_threshold),
                config.progress_logging,
            ),
            patch_generator: Arc::new(ConcatPatch),
        }
    }

    /// Replace the default [`ConcatPatch`] generator
    pub fn with_patch_generator(mut self, patch_generator: Arc<dyn PatchGenerator>) -> Self {
        self.patch_generator = patch_generator;
        self
    }

    /// Upload a new version, overwriting any existing one with the same id
    pub fn upload_new_version(
        &self,
        app_name: &str,
        version_id: &str,
        min_os_version: &str,
        content: impl Into<Vec<u8>>,
        is_beta: bool,
    ) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.registry.upload_version(
                app_name,
                version_id,
                min_os_version,
                content.into(),
                is_beta,
            )?;
        }

        info!(
            "New version {version_id} uploaded for app {app_name} (Min OS Version: {min_os_version})"
        );
        report_event(&RolloutEvent::VersionUploaded {
            app: app_name.to_owned(),
            version: version_id.to_owned(),
            min_os_version: min_os_version.to_owned(),
            is_beta,
        });
        Ok(())
    }

    /// Build an update patch from `from_version` to `to_version`.
    ///
    /// The generator output is returned as is.
    pub fn create_update_patch(
        &self,
        app_name: &str,
        from_version: &str,
        to_version: &str,
    ) -> Result<Vec<u8>> {
        let (old, new) = {
            let state = self.state.lock();
            payloads(&state.registry, app_name, from_version, to_version)?
        };

        let patch = self.patch_generator.compute_patch(&old, &new);
        report_event(&RolloutEvent::PatchCreated {
            app: app_name.to_owned(),
            from_version: from_version.to_owned(),
            to_version: to_version.to_owned(),
            size_bytes: patch.len(),
        });
        Ok(patch)
    }

    /// Newest version a device on `current_version_id` can update to.
    ///
    /// Returns `None` when the app is unknown, when `current_version_id` is not
    /// a registered version of it, or when nothing newer is compatible.
    pub fn check_for_updates(
        &self,
        app_name: &str,
        current_version_id: &str,
        device_os_version: &str,
    ) -> Option<String> {
        let update = {
            let state = self.state.lock();
            find_update(
                &self.evaluator,
                &state.registry,
                app_name,
                current_version_id,
                device_os_version,
            )
        };

        match &update {
            Some(version) => info!(
                "Update available: version {version} of app {app_name} for devices with OS {device_os_version}"
            ),
            None => debug!("No update available for app {app_name} on version {current_version_id}"),
        }
        update
    }

    /// Newest version installable on a device running `device_os_version`
    pub fn check_for_install(&self, app_name: &str, device_os_version: &str) -> Option<String> {
        let state = self.state.lock();
        self.evaluator
            .latest_compatible(&state.registry, app_name, device_os_version)
            .map(str::to_owned)
    }

    /// Roll `version_id` out to `device_ids` using the named strategy
    /// (`"beta"` or `"percentage"`).
    pub fn release_version<D: AsRef<str>>(
        &self,
        app_name: &str,
        version_id: &str,
        strategy: &str,
        percentage: u32,
        device_ids: &[D],
    ) -> Result<RolloutReport> {
        let report = {
            let mut state = self.state.lock();
            let ManagerState {
                registry,
                assignments,
            } = &mut *state;
            self.engine.release(
                registry,
                assignments,
                app_name,
                version_id,
                strategy,
                percentage,
                device_ids,
            )?
        };

        report_event(&RolloutEvent::RolloutCompleted {
            app: report.app.clone(),
            version: report.version.clone(),
            strategy: report.strategy.to_string(),
            requested: report.requested,
            target: report.target,
            released: report.released.len(),
        });
        Ok(report)
    }

    /// Resolve the newest installable version and hand it to `installer`
    pub fn install_latest(
        &self,
        app_name: &str,
        device_os_version: &str,
        installer: &mut dyn Installer,
    ) -> Option<String> {
        let version = self.check_for_install(app_name, device_os_version)?;
        installer.install(&version);
        Some(version)
    }

    /// Find an update for the device, build its patch and hand it to
    /// `installer`. Returns the version updated to, if any.
    pub fn apply_update(
        &self,
        app_name: &str,
        current_version_id: &str,
        device_os_version: &str,
        installer: &mut dyn Installer,
    ) -> Result<Option<String>> {
        let resolved = {
            let state = self.state.lock();
            match find_update(
                &self.evaluator,
                &state.registry,
                app_name,
                current_version_id,
                device_os_version,
            ) {
                Some(target) => {
                    let contents =
                        payloads(&state.registry, app_name, current_version_id, &target)?;
                    Some((target, contents))
                }
                None => None,
            }
        };

        let Some((target, (old, new))) = resolved else {
            return Ok(None);
        };

        let patch = self.patch_generator.compute_patch(&old, &new);
        installer.update(&patch);
        info!("Updated app {app_name} from {current_version_id} to {target}");
        Ok(Some(target))
    }

    pub fn get_version(&self, app_name: &str, version_id: &str) -> Result<VersionRecord> {
        self.state
            .lock()
            .registry
            .get_version(app_name, version_id)
            .cloned()
    }

    /// Snapshot of all versions of `app_name`, unordered
    pub fn list_versions(&self, app_name: &str) -> Vec<VersionRecord> {
        self.state
            .lock()
            .registry
            .list_versions(app_name)
            .cloned()
            .collect()
    }

    pub fn app_names(&self) -> Vec<String> {
        self.state
            .lock()
            .registry
            .app_names()
            .map(str::to_owned)
            .collect()
    }

    pub fn rollout_stage(&self, app_name: &str, version_id: &str) -> Result<RolloutStage> {
        let state = self.state.lock();
        let record = state.registry.get_version(app_name, version_id)?;
        Ok(RolloutStage::of(record))
    }

    /// Version most recently released to `device_id`
    pub fn assignment(&self, device_id: &str) -> Option<String> {
        self.state
            .lock()
            .assignments
            .get(device_id)
            .map(str::to_owned)
    }

    pub fn assignments(&self) -> HashMap<String, String> {
        self.state.lock().assignments.to_map()
    }
}

/// Update lookup; the current version has to be registered for the app
fn find_update(
    evaluator: &CompatibilityEvaluator,
    registry: &Registry,
    app_name: &str,
    current_version_id: &str,
    device_os_version: &str,
) -> Option<String> {
    registry.get_version(app_name, current_version_id).ok()?;
    evaluator
        .newer_compatible(registry, app_name, current_version_id, device_os_version)
        .map(str::to_owned)
}

fn payloads(
    registry: &Registry,
    app_name: &str,
    from_version: &str,
    to_version: &str,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let from = registry.get_version(app_name, from_version)?;
    let to = registry.get_version(app_name, to_version)?;
    Ok((from.content.clone(), to.content.clone()))
}
