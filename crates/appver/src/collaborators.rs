// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Boundaries to the patch generator and the on-device installer
//!
//! The manager never inspects what these produce; it hands the patch bytes
//! back to the caller verbatim and only supplies version ids to installers.

use std::fmt;
use tracing::info;

/// Produces an update patch between two version payloads
pub trait PatchGenerator: Send + Sync + fmt::Debug {
    fn compute_patch(&self, old: &[u8], new: &[u8]) -> Vec<u8>;
}

/// Executes installs and updates on a device
pub trait Installer: fmt::Debug {
    fn install(&mut self, version_id: &str);

    fn update(&mut self, patch: &[u8]);
}

/// Stand-in diff: the old payload followed by the new one
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatPatch;

impl PatchGenerator for ConcatPatch {
    fn compute_patch(&self, old: &[u8], new: &[u8]) -> Vec<u8> {
        let mut patch = Vec::with_capacity(old.len() + new.len());
        patch.extend_from_slice(old);
        patch.extend_from_slice(new);
        patch
    }
}

/// Installer that only records what it was asked to do
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInstaller;

impl Installer for LoggingInstaller {
    fn install(&mut self, version_id: &str) {
        info!("Installing app version: {version_id}");
    }

    fn update(&mut self, patch: &[u8]) {
        info!("Updating app with patch ({} bytes)", patch.len());
    }
}
