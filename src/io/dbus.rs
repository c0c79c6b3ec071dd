//! System sleep/resume monitoring via systemd-logind.
//!
//! A laptop lid closing is the desktop analogue of a host app moving to the
//! background, so logind's `PrepareForSleep` signal is translated into
//! lifecycle signals:
//!
//! - going to sleep: `WillResign` followed by `Suspend`
//! - waking up: `Resume`
//!
//! The monitor runs on its own thread using zbus's blocking API. If the
//! system bus is unavailable it logs a warning and the application carries
//! on without sleep detection.

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use zbus::blocking::Connection;

use crate::core::LifecycleSignal;
use crate::io::signals::SignalMessage;

const MAX_MONITOR_RESTARTS: u8 = 3;
const RESTART_DELAY_MS: u64 = 2000;

/// D-Bus proxy trait for systemd-logind Manager interface.
#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait LogindManager {
    /// `start` is true when the system is about to sleep and false on resume.
    #[zbus(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

/// Lifecycle signals produced by one `PrepareForSleep` emission.
pub fn lifecycle_for_sleep(going_to_sleep: bool) -> &'static [LifecycleSignal] {
    if going_to_sleep {
        &[LifecycleSignal::WillResign, LifecycleSignal::Suspend]
    } else {
        &[LifecycleSignal::Resume]
    }
}

/// Start sleep/resume monitoring in a dedicated thread.
///
/// The D-Bus connection is retried a few times before sleep detection is
/// given up on.
pub fn start_sleep_resume_monitor(
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    thread::Builder::new()
        .name("locatr-logind".into())
        .spawn(move || {
            for attempt in 0..=MAX_MONITOR_RESTARTS {
                match monitor_sleep_signals(&signal_sender, debug_enabled) {
                    Ok(()) => {
                        if debug_enabled {
                            log_pipe!();
                            log_debug!("Sleep monitor thread exiting normally");
                        }
                        return;
                    }
                    Err(e) => {
                        log_pipe!();
                        log_warning!("Sleep monitor error: {e:#}");

                        if attempt < MAX_MONITOR_RESTARTS {
                            log_indented!(
                                "Will restart D-Bus monitor (attempt {}/{})",
                                attempt + 1,
                                MAX_MONITOR_RESTARTS
                            );
                            thread::sleep(Duration::from_millis(RESTART_DELAY_MS));
                        }
                    }
                }
            }
            log_indented!("Maximum restart attempts reached for sleep monitor");
            log_indented!("Sleep/resume lifecycle signals will not be available");
        })
        .context("Failed to spawn sleep monitor thread")?;

    Ok(())
}

/// Forward PrepareForSleep signals until the channel closes.
fn monitor_sleep_signals(signal_sender: &Sender<SignalMessage>, debug_enabled: bool) -> Result<()> {
    let connection = Connection::system().context("Failed to connect to system D-Bus")?;

    let logind_proxy =
        LogindManagerProxyBlocking::new(&connection).context("Failed to create logind proxy")?;

    let sleep_signals = logind_proxy
        .receive_prepare_for_sleep()
        .context("Failed to subscribe to PrepareForSleep signals")?;

    if debug_enabled {
        log_debug!("Subscribed to systemd-logind PrepareForSleep signals");
    }

    for signal in sleep_signals {
        let going_to_sleep = match signal.args() {
            Ok(args) => args.start,
            Err(e) => {
                log_pipe!();
                log_warning!("Failed to parse PrepareForSleep signal args: {e}");
                continue;
            }
        };

        if debug_enabled {
            log_pipe!();
            if going_to_sleep {
                log_info!("System entering sleep/suspend mode");
            } else {
                log_info!("System resuming from sleep/suspend");
            }
        }

        for lifecycle in lifecycle_for_sleep(going_to_sleep) {
            if signal_sender
                .send(SignalMessage::Lifecycle(*lifecycle))
                .is_err()
            {
                return Ok(());
            }
        }
    }

    anyhow::bail!("D-Bus connection lost - PrepareForSleep signal stream ended")
}
