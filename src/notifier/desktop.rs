//! Desktop notifications over the freedesktop notification service.
//!
//! Uses zbus's blocking API on the session bus. Each notification replaces
//! the previous one so a fast fix stream does not pile up popups.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use zbus::blocking::Connection;
use zbus::zvariant::Value;

use super::DebugNotifier;
use crate::common::constants::{APP_NAME, NOTIFICATION_SUMMARY, NOTIFICATION_TIMEOUT_MS};

/// D-Bus proxy for org.freedesktop.Notifications.
#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Notifier that shows a desktop popup per fix.
pub struct DesktopNotifier {
    proxy: NotificationsProxyBlocking<'static>,
    last_id: AtomicU32,
}

impl DesktopNotifier {
    /// Connect to the session bus.
    pub fn connect() -> Result<Self> {
        let connection = Connection::session().context("Failed to connect to session D-Bus")?;
        let proxy = NotificationsProxyBlocking::new(&connection)
            .context("Failed to create notifications proxy")?;

        Ok(Self {
            proxy,
            last_id: AtomicU32::new(0),
        })
    }
}

impl DebugNotifier for DesktopNotifier {
    fn notify(&self, text: &str) -> Result<()> {
        let id = self
            .proxy
            .notify(
                APP_NAME,
                self.last_id.load(Ordering::Relaxed),
                "",
                NOTIFICATION_SUMMARY,
                text,
                &[],
                HashMap::new(),
                NOTIFICATION_TIMEOUT_MS,
            )
            .context("Notification request failed")?;

        self.last_id.store(id, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Desktop"
    }
}
