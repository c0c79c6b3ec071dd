//! Line-delimited JSON transport between the host and the run loop.
//!
//! Each stdin line is one `HostCommand`; each stdout line is one
//! `HostReply`. Commands are forwarded to the run loop as
//! `SignalMessage::Command`, and end of input requests a shutdown. The
//! reader never writes replies itself; only the run loop feeds the writer.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::delivery::CallbackId;
use crate::host::{HostCommand, HostReply};
use crate::io::signals::SignalMessage;

/// Decode commands from `reader` until end of input or until the run loop
/// stops listening.
///
/// Malformed lines carrying a `callbackId` are turned into an error reply
/// for the run loop to send; others are only logged.
pub fn read_commands<R: BufRead>(
    reader: R,
    signal_sender: &Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read host command")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<HostCommand>(line) {
            Ok(command) => {
                if debug_enabled {
                    log_debug!(
                        "Host command {} ({})",
                        command.action(),
                        command.callback_id()
                    );
                }
                if signal_sender.send(SignalMessage::Command(command)).is_err() {
                    return Ok(());
                }
            }
            Err(e) => match callback_id_of(line) {
                Some(callback_id) => {
                    let reply = HostReply::error(callback_id, format!("invalid command: {e}"));
                    if signal_sender.send(SignalMessage::Rejected(reply)).is_err() {
                        return Ok(());
                    }
                }
                None => {
                    log_pipe!();
                    log_warning!("Ignoring malformed host command: {e}");
                }
            },
        }
    }

    let _ = signal_sender.send(SignalMessage::Shutdown);
    Ok(())
}

/// Best-effort extraction of the callback id from an undecodable command.
fn callback_id_of(line: &str) -> Option<CallbackId> {
    let value: Value = serde_json::from_str(line).ok()?;
    value
        .get("callbackId")?
        .as_str()
        .map(CallbackId::new)
}

/// Write every reply as one JSON line until all reply senders are gone.
pub fn write_replies<W: Write>(mut writer: W, replies: Receiver<HostReply>) -> Result<()> {
    for reply in replies {
        let line = serde_json::to_string(&reply).context("Failed to encode host reply")?;
        writeln!(writer, "{line}").context("Failed to write host reply")?;
        writer.flush().context("Failed to flush host reply")?;
    }
    Ok(())
}

/// Spawn the stdin reader thread.
pub fn spawn_command_reader(
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("locatr-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin().lock();
            if let Err(e) = read_commands(stdin, &signal_sender, debug_enabled) {
                log_pipe!();
                log_error!("{e:#}");
                let _ = signal_sender.send(SignalMessage::Shutdown);
            }
        })
        .context("Failed to spawn stdin reader thread")
}

/// Spawn the stdout writer thread.
pub fn spawn_reply_writer(replies: Receiver<HostReply>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("locatr-stdout".into())
        .spawn(move || {
            if let Err(e) = write_replies(std::io::stdout().lock(), replies) {
                log_pipe!();
                log_error!("{e:#}");
            }
        })
        .context("Failed to spawn stdout writer thread")
}
