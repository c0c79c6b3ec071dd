//! The `run` command: serve host commands over stdin/stdout.
//!
//! Sets up every event producer (signals, logind, options file watcher,
//! stdin) and then processes their `SignalMessage`s on the main thread
//! until shutdown. Replies and streamed deliveries are written to stdout by
//! a dedicated writer thread.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::common::constants::MAIN_LOOP_POLL_MS;
use crate::common::utils::private_path;
use crate::config;
use crate::core::{Tracker, TrackerParams};
use crate::host::{self, HostReply};
use crate::io::signals::{SignalMessage, SignalState, setup_signal_handler};
use crate::io::{dbus, stdin};
use crate::source::{SimulatedSource, load_track};

/// Run the host bridge until stdin closes or a termination signal arrives.
///
/// # Arguments
/// * `track` - Optional recorded track replayed as the location source
/// * `debug_enabled` - Whether debug mode is enabled
pub fn handle_run_command(track: Option<&str>, debug_enabled: bool) -> Result<()> {
    log_version!();
    if debug_enabled {
        log_pipe!();
        log_debug!("Debug mode enabled - showing detailed tracker operations");
    }

    let signal_state = setup_signal_handler(debug_enabled)?;

    if let Err(e) = dbus::start_sleep_resume_monitor(signal_state.signal_sender.clone(), debug_enabled)
    {
        log_pipe!();
        log_warning!("D-Bus sleep/resume monitoring unavailable: {e}");
        log_indented!("Use SIGUSR1/SIGUSR2 to signal suspend and resume");
    }

    let source = match track {
        Some(path) => {
            let fixes = load_track(Path::new(path))?;
            if debug_enabled {
                log_block_start!("Replaying {} fixes from {}", fixes.len(), private_path(Path::new(path)));
            }
            SimulatedSource::new(fixes)
        }
        None => SimulatedSource::empty(),
    };

    let tracker = Tracker::new(TrackerParams {
        source: Box::new(source),
        notifier: super::create_notifier(debug_enabled),
    })?;

    let config_path = config::get_config_path()?;
    if let Err(e) = super::configure_from_options_file(&tracker) {
        log_pipe!();
        log_warning!("Failed to apply options file: {e:#}");
        log_indented!("Using default configuration until a valid configure arrives");
    }

    if let Err(e) = config::start_config_watcher(
        signal_state.signal_sender.clone(),
        config_path.clone(),
        debug_enabled,
    ) && debug_enabled
    {
        log_pipe!();
        log_warning!("Config file watching unavailable: {e}");
        log_indented!("Hot config reload disabled, use SIGHUP for manual reload");
    }

    let (reply_tx, reply_rx) = mpsc::channel::<HostReply>();
    let writer = stdin::spawn_reply_writer(reply_rx)?;
    // Blocks on stdin and is left detached at shutdown
    stdin::spawn_command_reader(signal_state.signal_sender.clone(), debug_enabled)?;

    log_block_start!("Waiting for host commands on stdin");

    run_loop(&tracker, &signal_state, &reply_tx, &config_path);

    tracker.shutdown();
    drop(reply_tx);
    writer
        .join()
        .map_err(|_| anyhow::anyhow!("Reply writer thread panicked"))
        .context("Failed to flush pending replies")?;

    log_block_start!("Shutdown complete");
    log_end!();
    Ok(())
}

fn run_loop(
    tracker: &Tracker,
    signal_state: &SignalState,
    replies: &Sender<HostReply>,
    config_path: &Path,
) {
    while signal_state.is_running() {
        let message = match signal_state
            .signal_receiver
            .recv_timeout(Duration::from_millis(MAIN_LOOP_POLL_MS))
        {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match message {
            SignalMessage::Command(command) => {
                let reply = host::dispatch(tracker, command, |id| {
                    host::forward_deliveries(id, replies.clone())
                });
                if let Some(reply) = reply {
                    let _ = replies.send(reply);
                }
            }
            SignalMessage::Rejected(reply) => {
                let _ = replies.send(reply);
            }
            SignalMessage::Lifecycle(signal) => tracker.handle_lifecycle(signal),
            SignalMessage::Reload => super::reload_configuration(tracker, config_path),
            SignalMessage::Shutdown => signal_state.request_shutdown(),
        }
    }
}
