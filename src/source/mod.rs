//! Location source abstraction.
//!
//! A `LocationSource` wraps whatever produces position fixes. The tracker
//! drives it through start/stop/request calls, and the source reports back
//! asynchronously by sending `SourceEvent`s on the channel handed to it in
//! `attach`, typically from its own thread.
//!
//! ## Implementations
//!
//! - [`simulated::SimulatedSource`]: replays a recorded track and accepts
//!   injected events. Used by the `simulate` command and the test suite.

pub mod simulated;

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::config::{AccuracyTier, ActivityHint, Configuration};

pub use simulated::{SimulatedHandle, SimulatedSource, load_track};

/// One reported position sample.
///
/// Negative `speed` and `course` mean the source could not determine them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Degrees
    pub latitude: f64,
    /// Degrees
    pub longitude: f64,
    /// Meters
    pub horizontal_accuracy: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Meters per second
    #[serde(default = "unknown")]
    pub speed: f64,
    /// Meters
    #[serde(default)]
    pub altitude: f64,
    /// Degrees from true north
    #[serde(default = "unknown")]
    pub course: f64,
}

fn unknown() -> f64 {
    -1.0
}

/// Coarse classification of source failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// The user or system refused location access.
    Denied,
    /// No fix could be obtained right now.
    LocationUnknown,
    Network,
    Other,
}

/// A failure reported asynchronously by the location source.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{description}")]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub description: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

/// Events a location source emits.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// One or more fixes in the order the source produced them.
    Locations(Vec<Fix>),
    Failed(SourceError),
    /// The source paused updates on its own (e.g. device stationary).
    Paused,
    Resumed,
    /// Batched background delivery could not be completed.
    DeferredUpdatesFailed(Option<String>),
}

/// Settings pushed into the source before continuous tracking starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub accuracy_tier: AccuracyTier,
    pub distance_filter_meters: f64,
    pub activity_hint: ActivityHint,
    pub pauses_automatically: bool,
    pub interval_seconds: f64,
    pub aggressive_interval_seconds: f64,
}

impl From<&Configuration> for SourceSettings {
    fn from(config: &Configuration) -> Self {
        Self {
            accuracy_tier: config.accuracy_tier,
            distance_filter_meters: config.distance_filter_meters,
            activity_hint: config.activity_hint,
            pauses_automatically: true,
            interval_seconds: config.interval_seconds,
            aggressive_interval_seconds: config.aggressive_interval_seconds,
        }
    }
}

/// What the platform reports about location services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceAvailability {
    pub services_enabled: bool,
    pub significant_change_available: bool,
}

/// Interface over the positioning hardware or service.
///
/// Calls return immediately; outcomes arrive as `SourceEvent`s. The source is
/// a long-lived singleton shared by start, stop and one-shot requests.
#[cfg_attr(test, mockall::automock)]
pub trait LocationSource: Send {
    /// Install the channel on which the source reports events.
    fn attach(&mut self, events: Sender<SourceEvent>);

    fn apply_settings(&mut self, settings: &SourceSettings);

    /// Begin continuous, low-power tracking.
    fn start_updating(&mut self);

    fn stop_updating(&mut self);

    /// Ask for a single fix. Fire-and-forget: if the source never answers,
    /// nothing is reported.
    fn request_location(&mut self);

    fn availability(&self) -> SourceAvailability;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}
