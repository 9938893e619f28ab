// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! appver - application version registry and rollout engine
//!
//! Tracks uploaded versions per application, answers "is there an update" and
//! "what should a fresh install get" for a device OS, and releases versions to
//! devices either wholesale (beta) or to a deterministic hash-selected cohort
//! (percentage). State is in-memory only.

pub mod collaborators;
pub mod compat;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod rollout;
pub mod sampler;
pub mod telemetry;

pub use collaborators::{ConcatPatch, Installer, LoggingInstaller, PatchGenerator};
pub use compat::{CompatibilityEvaluator, VersionOrdering};
pub use config::{ManagerConfig, load_config, save_config};
pub use error::{Result, VersionError};
pub use manager::VersionManager;
pub use registry::{Application, Registry, VersionRecord};
pub use rollout::{RolloutAssignments, RolloutEngine, RolloutReport, RolloutStage, RolloutStrategy};
pub use sampler::{DeterministicSampler, target_count};
