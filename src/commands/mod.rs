//! Command-line command handlers for locatr.
//!
//! Each command lives in its own submodule. The helpers here build the
//! pieces both long-running commands share: the debug notifier and the
//! initial Configure from the options file.

pub mod help;
pub mod run;
pub mod simulate;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config;
use crate::core::Tracker;
use crate::notifier::{DebugNotifier, DesktopNotifier, LogNotifier};

/// Desktop notifications when a session bus is available, log lines otherwise.
pub(crate) fn create_notifier(debug_enabled: bool) -> Arc<dyn DebugNotifier> {
    match DesktopNotifier::connect() {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            if debug_enabled {
                log_pipe!();
                log_debug!("Desktop notifications unavailable: {e:#}");
                log_indented!("Debug notifications will be written to the log");
            }
            Arc::new(LogNotifier)
        }
    }
}

/// Configure `tracker` from the options file, creating it with defaults
/// when missing.
pub(crate) fn configure_from_options_file(tracker: &Tracker) -> Result<()> {
    let params = config::load()?;
    tracker
        .configure(params)
        .context("Options file contains an invalid configuration")
}

/// Re-run Configure from the file at `path`, keeping the previous
/// configuration if anything fails.
pub(crate) fn reload_configuration(tracker: &Tracker, path: &Path) {
    let result = config::load_from_path(path).and_then(|params| {
        tracker
            .configure(params)
            .context("Options file contains an invalid configuration")
    });

    match result {
        Ok(()) => {
            log_pipe!();
            log_info!("Configuration reloaded");
        }
        Err(e) => {
            log_pipe!();
            log_error!("Failed to reload configuration: {e:#}");
            log_indented!("Continuing with previous configuration");
        }
    }
}
