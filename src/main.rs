//! fmutex: lock and unlock file-based mutexes from the command line.
//!
//! This is the main entry point for the `fmutex` CLI. It parses arguments,
//! resolves configuration, sets up logging, dispatches to the command
//! handler, and maps errors to exit codes.

mod cli;
mod commands;

use cli::Cli;
use fmutex::logging;
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config = match commands::resolve_config(&cli.global, &cli.command) {
        Ok(config) => config,
        Err(err) => {
            logging::init(cli.global.silent);
            error!("{}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    logging::init(config.silent);

    match commands::dispatch(cli.command, &config) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
