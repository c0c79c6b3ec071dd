//! Tracking configuration: raw Configure input, validated parameters, and the
//! accuracy and activity enumerations derived from them.
//!
//! ## Configuration Sources
//!
//! Parameters reach the tracker through `Configure`, either from the host
//! bridge (named or positional arguments) or from the options file:
//!
//! ```toml
//! distance_filter_meters = 0        # Minimum movement between fixes (0 = no filtering)
//! requested_accuracy_distance = 10  # Desired accuracy in meters (mapped to a tier)
//! interval_ms = 5000                # Update interval in milliseconds
//! aggressive_interval_ms = 2000     # Interval used while actively moving
//! activity_label = "Fitness"        # AutomotiveNavigation, OtherNavigation, Fitness, Other
//! debug = false                     # Verbose logging and debug notifications
//! use_activity_detection = false    # Activity-recognition hint passthrough
//! ```
//!
//! A successful `Configure` replaces every field at once. The new values are
//! read by the next `Start`; a running location source keeps the settings it
//! was started with.

pub mod loading;
pub mod mapping;
pub mod validation;
pub mod watcher;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::common::constants::*;

pub use loading::{create_default_config, get_config_path, load, load_from_path, set_config_dir};
pub use mapping::{resolve_accuracy_tier, resolve_activity_hint};
pub use validation::ConfigError;
pub use watcher::start_config_watcher;

/// Precision/power setting requested from the positioning source.
///
/// Variants are ordered from most to least precise, so `a < b` means `a`
/// asks for a tighter fix than `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    /// Highest precision, supplemented by auxiliary sensor data.
    BestForNavigation,
    Best,
    NearestTenMeters,
    HundredMeters,
    Kilometer,
    ThreeKilometers,
}

impl AccuracyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyTier::BestForNavigation => "best-for-navigation",
            AccuracyTier::Best => "best",
            AccuracyTier::NearestTenMeters => "nearest-ten-meters",
            AccuracyTier::HundredMeters => "hundred-meters",
            AccuracyTier::Kilometer => "kilometer",
            AccuracyTier::ThreeKilometers => "three-kilometers",
        }
    }
}

impl std::fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity hint passed through to the location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityHint {
    Automotive,
    OtherNavigation,
    Fitness,
    #[default]
    Other,
}

impl ActivityHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityHint::Automotive => ACTIVITY_AUTOMOTIVE_NAVIGATION,
            ActivityHint::OtherNavigation => ACTIVITY_OTHER_NAVIGATION,
            ActivityHint::Fitness => ACTIVITY_FITNESS,
            ActivityHint::Other => "Other",
        }
    }
}

impl std::fmt::Display for ActivityHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `Configure` input as supplied by the host or the options file.
///
/// Nothing here is trusted yet; convert with `Configuration::try_from`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigureParams {
    pub distance_filter_meters: f64,
    pub requested_accuracy_distance: i64,
    pub interval_ms: i64,
    pub aggressive_interval_ms: i64,
    pub activity_label: String,
    /// Optional on the wire; anything but a boolean is treated as unset.
    #[serde(default, deserialize_with = "validation::lenient_flag")]
    pub debug: Option<bool>,
    pub use_activity_detection: bool,
}

/// Validated tracking parameters.
///
/// Replaced as a whole by every successful `Configure`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    /// Minimum movement in meters between reported fixes (0 = no filtering)
    pub distance_filter_meters: f64,
    pub accuracy_tier: AccuracyTier,
    pub interval_seconds: f64,
    pub aggressive_interval_seconds: f64,
    pub activity_hint: ActivityHint,
    pub debug_enabled: bool,
    pub use_activity_detection: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            distance_filter_meters: DEFAULT_DISTANCE_FILTER_METERS,
            accuracy_tier: AccuracyTier::Best,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            aggressive_interval_seconds: DEFAULT_AGGRESSIVE_INTERVAL_SECONDS,
            activity_hint: ActivityHint::Other,
            debug_enabled: false,
            use_activity_detection: false,
        }
    }
}

impl Configuration {
    /// Log the configuration summary block.
    pub fn log_summary(&self) {
        log_block_start!("Configuration Success");
        log_indented!("Distance Filter     {} m", self.distance_filter_meters);
        log_indented!("Desired Accuracy    {}", self.accuracy_tier);
        log_indented!("Activity Type       {}", self.activity_hint);
        log_indented!("Update Interval     {} s", self.interval_seconds);
        log_indented!("Aggressive Interval {} s", self.aggressive_interval_seconds);
        log_indented!("Activity Detection  {}", self.use_activity_detection);
    }
}
