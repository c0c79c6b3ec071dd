//! Help command implementation for locatr.
//!
//! Shows command-specific help or the general command list.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "run" => log_block_start!("Usage: locatr run [--track <file>]"),
        "simulate" => log_block_start!("Usage: locatr simulate <track>"),
        _ => log_block_start!("Usage: locatr [OPTIONS] [COMMAND]"),
    }
}

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("run") => display_run_help(),
        Some("simulate") => display_simulate_help(),
        Some("help") => display_help_help(),
        Some("version") => {
            log_version!();
            log_block_start!("version - Print version information");
            log_end!();
        }
        Some(unknown) => {
            log_warning!("Unknown command: {unknown}");
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("run [--track <file>]   Serve host commands on stdin/stdout (default)");
    log_indented!("simulate <track>       Replay a recorded track and print deliveries");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_indented!("version                Print version information");
    log_pipe!();
    log_info!("Use 'locatr help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'locatr --help' to see all options and general usage.");
    log_end!();
}

fn display_run_help() {
    log_version!();
    log_block_start!("run - Serve host commands on stdin/stdout");
    show_command_usage("run");
    log_block_start!("Options:");
    log_indented!("-t, --track <file>  Replay a recorded track as the location source");
    log_block_start!("Protocol:");
    log_indented!("One JSON command per stdin line, one JSON reply per stdout line");
    log_indented!("{{\"action\":\"start\",\"callbackId\":\"1\"}}");
    log_indented!("Actions: configure, registerForLocationUpdates, requestCurrentLocation,");
    log_indented!("         start, stop, getVersion");
    log_block_start!("Signals:");
    log_indented!("SIGUSR1  App suspended (background)");
    log_indented!("SIGUSR2  App resumed (foreground)");
    log_indented!("SIGHUP   Reload the options file");
    log_end!();
}

fn display_simulate_help() {
    log_version!();
    log_block_start!("simulate - Replay a recorded track through the tracker");
    show_command_usage("simulate");
    log_block_start!("Arguments:");
    log_indented!("track  JSON array of fixes:");
    log_indented!("       [{{\"latitude\":52.5,\"longitude\":13.4,");
    log_indented!("         \"horizontal_accuracy\":5.0,\"timestamp_ms\":1700000000000}}]");
    log_block_start!("The options file decides pacing, distance filter and debug output.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: locatr help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("locatr help");
    log_indented!("locatr help simulate");
    log_end!();
}
