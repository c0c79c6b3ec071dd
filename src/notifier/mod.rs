//! Debug notifications mirroring each delivered fix.
//!
//! Only invoked while the configuration has debug enabled. Failures are
//! logged by the caller and never affect delivery.

pub mod desktop;

use anyhow::Result;

use crate::source::Fix;

pub use desktop::DesktopNotifier;

/// Something that can show a short, locally visible message.
pub trait DebugNotifier: Send + Sync {
    fn notify(&self, text: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DebugNotifier for LogNotifier {
    fn notify(&self, text: &str) -> Result<()> {
        log_info!("{text}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Log"
    }
}

/// Notification text for a fix.
pub fn fix_message(fix: &Fix) -> String {
    format!(
        "Got Location Update:  {{ {} - {} }}  Accuracy: {}",
        fix.latitude, fix.longitude, fix.horizontal_accuracy
    )
}
