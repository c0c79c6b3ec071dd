//! Command-line argument parsing and processing.
//!
//! ```text
//! locatr [--debug] [--config <dir>] [--log <file>] [COMMAND]
//! ```
//!
//! Flags may appear before or after the command. Without a command the
//! host bridge runs (`run`). Unknown options and stray arguments show help
//! and exit non-zero.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Serve host commands on stdin/stdout
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
        track: Option<String>,
    },
    /// Replay a recorded track through the tracker and print the deliveries
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
        track: String,
    },
    /// `help [COMMAND]`
    HelpCommand { command: Option<String> },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

#[derive(Default)]
struct Flags {
    debug_enabled: bool,
    help: bool,
    version: bool,
    config_dir: Option<String>,
    log_file: Option<String>,
    track: Option<String>,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ParsedArgs {
            action: parse_action(args.into_iter().skip(1).map(|s| s.as_ref().to_string())),
        }
    }
}

fn parse_action(args: impl Iterator<Item = String>) -> CliAction {
    let mut flags = Flags::default();
    let mut positionals: Vec<String> = Vec::new();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" | "-d" => flags.debug_enabled = true,
            "--help" | "-h" => flags.help = true,
            "--version" | "-V" | "-v" => flags.version = true,
            "--config" | "-c" | "--log" | "-l" | "--track" | "-t" => {
                let Some(value) = args.next_if(|next| !next.starts_with('-')) else {
                    log_warning!("Missing value for {arg}");
                    return CliAction::ShowHelpDueToError;
                };
                let slot = match arg.as_str() {
                    "--config" | "-c" => &mut flags.config_dir,
                    "--log" | "-l" => &mut flags.log_file,
                    _ => &mut flags.track,
                };
                *slot = Some(value);
            }
            unknown if unknown.starts_with('-') => {
                log_warning!("Unknown option: {unknown}");
                return CliAction::ShowHelpDueToError;
            }
            _ => positionals.push(arg),
        }
    }

    // Version takes precedence over help, help over everything else
    if flags.version {
        return CliAction::ShowVersion;
    }
    if flags.help {
        return CliAction::ShowHelp;
    }

    // No command means run
    let command = positionals.first().map_or("run", String::as_str);
    let rest = positionals.get(1..).unwrap_or_default();

    if flags.track.is_some() && command != "run" {
        log_warning!("--track is only valid with the run command");
        return CliAction::ShowHelpDueToError;
    }

    match (command, rest) {
        ("run", []) => CliAction::Run {
            debug_enabled: flags.debug_enabled,
            config_dir: flags.config_dir,
            log_file: flags.log_file,
            track: flags.track,
        },
        ("simulate", [track]) => CliAction::Simulate {
            debug_enabled: flags.debug_enabled,
            config_dir: flags.config_dir,
            log_file: flags.log_file,
            track: track.clone(),
        },
        ("simulate", []) => {
            log_warning!("Missing track file. Usage: locatr simulate <track>");
            CliAction::ShowHelpDueToError
        }
        ("help", []) => CliAction::HelpCommand { command: None },
        ("help", [topic]) => CliAction::HelpCommand {
            command: Some(topic.clone()),
        },
        ("version", []) => CliAction::ShowVersion,
        (command, extra) if is_command(command) => {
            log_warning!(
                "Unexpected arguments for {command}: {}",
                extra.join(" ")
            );
            CliAction::ShowHelpDueToError
        }
        (unknown, _) => {
            log_warning!("Unknown command: {unknown}");
            CliAction::ShowHelpDueToError
        }
    }
}

fn is_command(name: &str) -> bool {
    matches!(name, "run" | "simulate" | "help" | "version")
}

/// Displays the full usage text.
pub fn display_help() {
    log_version!();
    log_block_start!("Usage: locatr [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use a custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-l, --log <file>       Write log output to a file");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run [--track <file>]   Serve host commands on stdin/stdout (default)");
    log_indented!("simulate <track>       Replay a recorded track and print deliveries");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_indented!("version                Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_action(debug_enabled: bool) -> CliAction {
        CliAction::Run {
            debug_enabled,
            config_dir: None,
            log_file: None,
            track: None,
        }
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["locatr"]);
        assert_eq!(parsed.action, run_action(false));
    }

    #[test]
    fn test_parse_debug_flag() {
        let parsed = ParsedArgs::parse(vec!["locatr", "--debug"]);
        assert_eq!(parsed.action, run_action(true));

        let parsed = ParsedArgs::parse(vec!["locatr", "-d", "run"]);
        assert_eq!(parsed.action, run_action(true));
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(ParsedArgs::parse(vec!["locatr", "-h"]).action, CliAction::ShowHelp);
        assert_eq!(
            ParsedArgs::parse(vec!["locatr", "--version"]).action,
            CliAction::ShowVersion
        );
        assert_eq!(
            ParsedArgs::parse(vec!["locatr", "version"]).action,
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["locatr", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_run_with_all_options() {
        let parsed = ParsedArgs::parse(vec![
            "locatr", "run", "--track", "trip.json", "-c", "/tmp/cfg", "--log", "out.log", "-d",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/cfg".to_string()),
                log_file: Some("out.log".to_string()),
                track: Some("trip.json".to_string()),
            }
        );
    }

    #[test]
    fn test_track_without_command_runs() {
        let parsed = ParsedArgs::parse(vec!["locatr", "--track", "trip.json"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                log_file: None,
                track: Some("trip.json".to_string()),
            }
        );
    }

    #[test]
    fn test_simulate_requires_track() {
        let parsed = ParsedArgs::parse(vec!["locatr", "simulate", "walk.json"]);
        assert_eq!(
            parsed.action,
            CliAction::Simulate {
                debug_enabled: false,
                config_dir: None,
                log_file: None,
                track: "walk.json".to_string(),
            }
        );

        let parsed = ParsedArgs::parse(vec!["locatr", "simulate"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_track_flag_only_for_run() {
        let parsed = ParsedArgs::parse(vec!["locatr", "simulate", "a.json", "--track", "b.json"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_help_subcommand() {
        assert_eq!(
            ParsedArgs::parse(vec!["locatr", "help"]).action,
            CliAction::HelpCommand { command: None }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["locatr", "help", "simulate"]).action,
            CliAction::HelpCommand {
                command: Some("simulate".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_arguments() {
        for args in [
            vec!["locatr", "--unknown"],
            vec!["locatr", "fly"],
            vec!["locatr", "run", "extra"],
            vec!["locatr", "--config"],
            vec!["locatr", "--log", "--debug"],
        ] {
            assert_eq!(
                ParsedArgs::parse(args.clone()).action,
                CliAction::ShowHelpDueToError,
                "{args:?}"
            );
        }
    }
}
