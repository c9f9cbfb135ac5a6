//! Background entry points for the two batch jobs.

pub mod background;
pub mod clustering_job;
pub mod detection_job;

use crate::shared::settings::Settings;

use background::JobHandle;

/// Runs detection over the asset manifest on a background thread.
///
/// With `include_processed`, assets already flagged as face-detected are
/// processed again; otherwise only new assets are.
pub fn spawn_detection(settings: Settings, include_processed: bool) -> JobHandle {
    background::spawn("detection", move || {
        detection_job::run(&settings, include_processed)
    })
}

/// Runs clustering over the current encoding artifact on a background thread.
pub fn spawn_clustering(settings: Settings) -> JobHandle {
    background::spawn("clustering", move || clustering_job::run(&settings))
}
