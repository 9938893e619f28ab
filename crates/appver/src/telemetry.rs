// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Telemetry module for reporting version and rollout events

use serde::Serialize;

const PROGRESS_BAR_WIDTH: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub enum RolloutEvent {
    VersionUploaded {
        app: String,
        version: String,
        min_os_version: String,
        is_beta: bool,
    },
    RolloutCompleted {
        app: String,
        version: String,
        strategy: String,
        requested: usize,
        target: usize,
        released: usize,
    },
    PatchCreated {
        app: String,
        from_version: String,
        to_version: String,
        size_bytes: usize,
    },
}

/// Log an event as JSON
///
/// Fire-and-forget: a serialization failure is logged and swallowed.
pub fn report_event(event: &RolloutEvent) {
    match serde_json::to_string(event) {
        Ok(event_json) => tracing::info!("Telemetry event: {event_json}"),
        Err(e) => tracing::warn!("Failed to serialize telemetry event: {e}"),
    }
}

/// Render a 50-cell progress bar for `progress` in percent (clamped to 0..=100)
pub fn progress_bar(progress: f64) -> String {
    let filled = if progress.is_nan() {
        0
    } else {
        // Clamped to 0..=50 before the cast
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cells = (progress.clamp(0.0, 100.0) / 2.0) as usize;
        cells
    };
    format!(
        "{}{}",
        "█".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

/// Percentage of `done` out of `total`; an empty rollout counts as complete
pub fn progress_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    #[expect(clippy::cast_precision_loss)]
    let pct = done as f64 / total as f64 * 100.0;
    pct
}
