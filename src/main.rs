//! Binary entry point: parse arguments, set up logging and dispatch to the
//! command handlers.

use anyhow::Result;

use locatr::args::{self, CliAction, ParsedArgs};
use locatr::commands;
use locatr::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use locatr::config;
use locatr::logger::{Log, LoggerGuard};
use locatr::{log_end, log_error_exit, log_indented, log_version};

fn main() {
    let parsed_args = ParsedArgs::parse(std::env::args());

    let code = match run(parsed_args.action) {
        Ok(code) => code,
        Err(e) => {
            log_error_exit!("{e}");
            for cause in e.chain().skip(1) {
                log_indented!("Caused by: {cause}");
            }
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}

fn run(action: CliAction) -> Result<i32> {
    match action {
        CliAction::ShowVersion => {
            log_version!();
            log_end!();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(EXIT_FAILURE)
        }
        CliAction::HelpCommand { command } => {
            commands::help::run_help_command(command.as_deref())?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
            track,
        } => {
            let _guard = prepare(config_dir, log_file)?;
            commands::run::handle_run_command(track.as_deref(), debug_enabled)?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            log_file,
            track,
        } => {
            let _guard = prepare(config_dir, log_file)?;
            commands::simulate::handle_simulate_command(&track, debug_enabled)?;
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Apply the global options shared by the long-running commands.
fn prepare(config_dir: Option<String>, log_file: Option<String>) -> Result<Option<LoggerGuard>> {
    config::set_config_dir(config_dir)?;
    log_file.map(Log::start_file_logging).transpose()
}
