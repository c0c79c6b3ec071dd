//! The `simulate` command: replay a recorded track through the tracker.
//!
//! Configures the tracker from the options file, registers a consumer that
//! prints every delivery to stdout as a host reply line, starts tracking and
//! waits until the whole track has been replayed (or Ctrl+C).

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::common::constants::MAIN_LOOP_POLL_MS;
use crate::common::utils::private_path;
use crate::core::{Tracker, TrackerParams};
use crate::delivery::{CallbackHandle, Delivery, Payload};
use crate::host::HostReply;
use crate::io::signals::setup_signal_handler;
use crate::source::{SimulatedSource, load_track};

const SIMULATE_CALLBACK_ID: &str = "simulate";

/// Handle the `simulate` command.
///
/// # Arguments
/// * `track_path` - JSON file containing an array of fixes
/// * `debug_enabled` - Whether debug mode is enabled
pub fn handle_simulate_command(track_path: &str, debug_enabled: bool) -> Result<()> {
    log_version!();

    let track = load_track(Path::new(track_path))?;
    if track.is_empty() {
        anyhow::bail!("Track {} contains no fixes", private_path(Path::new(track_path)));
    }
    let total = track.len();

    let signal_state = setup_signal_handler(debug_enabled)?;

    let source = SimulatedSource::new(track);
    let replay = source.handle();
    let tracker = Tracker::new(TrackerParams {
        source: Box::new(source),
        notifier: super::create_notifier(debug_enabled),
    })?;

    super::configure_from_options_file(&tracker)?;
    let interval = tracker.configuration().interval_seconds;

    log_block_start!("Replaying {total} fixes, one every {interval} s");
    log_indented!("Track: {}", private_path(Path::new(track_path)));

    let (consumer, deliveries) = CallbackHandle::channel(SIMULATE_CALLBACK_ID);
    tracker.register_for_updates(consumer);
    tracker.start();

    let mut printed = 0;
    while signal_state.is_running() && !replay.is_finished() {
        match deliveries.recv_timeout(Duration::from_millis(MAIN_LOOP_POLL_MS)) {
            Ok(delivery) => {
                print_delivery(delivery)?;
                printed += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracker.shutdown();
    printed += drain(deliveries)?;

    log_block_start!("Simulation complete");
    log_indented!("Deliveries printed: {printed}");
    log_end!();
    Ok(())
}

/// Print what is still queued once the tracker has shut down.
fn drain(deliveries: Receiver<Delivery>) -> Result<usize> {
    let mut count = 0;
    for delivery in deliveries {
        print_delivery(delivery)?;
        count += 1;
    }
    Ok(count)
}

fn print_delivery(delivery: Delivery) -> Result<()> {
    match &delivery.payload {
        Payload::Location(fix) => {
            log_decorated!(
                "{}  {:.6}, {:.6}  ±{} m",
                format_timestamp(fix.timestamp),
                fix.latitude,
                fix.longitude,
                fix.accuracy
            );
        }
        Payload::Error(message) => log_warning!("Location error: {message}"),
    }

    let line = serde_json::to_string(&HostReply::from(delivery))
        .context("Failed to encode delivery")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("Failed to write delivery")?;
    stdout.flush().context("Failed to flush delivery")?;
    Ok(())
}

/// Local wall-clock time of a fix timestamp in epoch milliseconds.
fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("@{timestamp_ms}ms"))
}
