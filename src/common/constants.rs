//! Application-wide constants.

/// Version string reported by the `getVersion` operation.
pub const PLUGIN_VERSION: &str = "1.0";

pub const APP_NAME: &str = "locatr";
pub const CONFIG_FILE_NAME: &str = "locatr.toml";

// # Configuration defaults (used until the first successful Configure)

pub const DEFAULT_DISTANCE_FILTER_METERS: f64 = 0.0;
pub const DEFAULT_INTERVAL_SECONDS: f64 = 5.0;
pub const DEFAULT_AGGRESSIVE_INTERVAL_SECONDS: f64 = 2.0;
pub const MILLIS_PER_SECOND: f64 = 1000.0;

// # Accuracy tier thresholds in meters (upper bounds, exclusive)

pub const BEST_ACCURACY_LIMIT: i64 = 10;
pub const TEN_METER_ACCURACY_LIMIT: i64 = 100;
pub const HUNDRED_METER_ACCURACY_LIMIT: i64 = 1000;
pub const KILOMETER_ACCURACY_LIMIT: i64 = 3000;

// # Activity labels accepted from the host

pub const ACTIVITY_AUTOMOTIVE_NAVIGATION: &str = "AutomotiveNavigation";
pub const ACTIVITY_OTHER_NAVIGATION: &str = "OtherNavigation";
pub const ACTIVITY_FITNESS: &str = "Fitness";

// # Simulated source

/// Consecutive stationary fixes after which an auto-pausing source pauses.
pub const STATIONARY_FIXES_BEFORE_PAUSE: usize = 3;
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

// # Debug notifier

pub const NOTIFICATION_SUMMARY: &str = "Location update";
pub const NOTIFICATION_TIMEOUT_MS: i32 = 5000;

// # Config watcher

/// Debounce window for options file changes (editors write in several steps).
pub const CONFIG_WATCH_DEBOUNCE_MS: u64 = 500;

// # Main loop

pub const MAIN_LOOP_POLL_MS: u64 = 100;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
