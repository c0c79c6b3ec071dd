//! Tracker state shared between the API surface and the event pump.

use serde::Serialize;

use crate::config::Configuration;

/// Whether continuous tracking is running. Only `Start`/`Stop` change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    #[default]
    Disabled,
    Enabled,
}

/// Whether the host application is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Foreground,
    Background,
}

/// Mutable state guarded by the tracker's state mutex.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrackerState {
    pub tracking: TrackingState,
    pub lifecycle: LifecycleState,
    /// Read by `Start` when pushing settings into the source
    pub config: Configuration,
}
