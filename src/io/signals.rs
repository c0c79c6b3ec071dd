//! Unix signal handling and the unified message channel of the run loop.
//!
//! Every external event reaches the main loop as a `SignalMessage` on one
//! channel: OS signals, logind sleep/resume, options file changes and host
//! commands read from stdin.
//!
//! | signal | effect |
//! |---|---|
//! | `SIGUSR1` | lifecycle suspend |
//! | `SIGUSR2` | lifecycle resume |
//! | `SIGHUP` | reload the options file |
//! | `SIGINT`, `SIGTERM` | graceful shutdown |

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;

use crate::core::LifecycleSignal;
use crate::host::{HostCommand, HostReply};

/// Unified message type for everything the run loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    /// A command decoded from the host.
    Command(HostCommand),
    /// A host command that could not be decoded, already answered.
    Rejected(HostReply),
    /// The host application changed execution state.
    Lifecycle(LifecycleSignal),
    /// Re-read the options file and re-run Configure.
    Reload,
    /// Stop tracking and exit.
    Shutdown,
}

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared once a shutdown has been requested
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned by every other producer (stdin reader, logind monitor, watcher)
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Map a raw signal number onto the message it produces.
pub fn message_for_signal(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGUSR1 => Some(SignalMessage::Lifecycle(LifecycleSignal::Suspend)),
        SIGUSR2 => Some(SignalMessage::Lifecycle(LifecycleSignal::Resume)),
        SIGHUP => Some(SignalMessage::Reload),
        SIGINT | SIGTERM => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that turns incoming signals into
/// `SignalMessage`s. Repeated termination requests keep being forwarded;
/// the thread exits once the receiving side is gone.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    let sender = signal_sender.clone();

    thread::Builder::new()
        .name("locatr-signals".into())
        .spawn(move || {
            for sig in signals.forever() {
                let Some(message) = message_for_signal(sig) else {
                    continue;
                };

                match &message {
                    SignalMessage::Shutdown => {
                        log_pipe!();
                        if debug_enabled && sig == SIGINT {
                            log_info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                        } else {
                            log_info!("Received termination request, initiating graceful shutdown...");
                        }
                        running_clone.store(false, Ordering::SeqCst);
                    }
                    SignalMessage::Reload => {
                        log_pipe!();
                        log_info!("Received configuration reload signal");
                    }
                    SignalMessage::Lifecycle(signal) if debug_enabled => {
                        log_pipe!();
                        log_debug!("Received lifecycle signal: {}", signal.as_str());
                    }
                    _ => {}
                }

                if sender.send(message).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}
