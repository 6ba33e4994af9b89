//! CLI argument parsing for fmutex.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand};
use fmutex::config::parse_duration;
use std::path::PathBuf;

/// fmutex: lock and unlock file-based mutexes.
///
/// A mutex lives in `<root>/<id>/` and may be shared by any process that can
/// reach the same directory, including over a network filesystem.
#[derive(Parser, Debug)]
#[command(name = "fmutex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Root directory for mutex(es) [default: system temp directory].
    #[arg(long, global = true, env = "FMUTEX_ROOT")]
    pub root: Option<PathBuf>,

    /// Mutex id.
    #[arg(long, global = true, env = "FMUTEX_ID")]
    pub id: Option<String>,

    /// Silent execution.
    #[arg(short, long, global = true)]
    pub silent: bool,

    /// YAML config file with defaults for any of these options.
    #[arg(long, global = true, env = "FMUTEX_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands for fmutex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lock the mutex, waiting until it is free.
    ///
    /// Prints LOCKED on success. The lock outlives this process and must be
    /// released with `fmutex release`.
    Lock(LockArgs),

    /// Release the mutex.
    ///
    /// Prints RELEASED on success. Fails if the mutex is not locked.
    #[command(alias = "unlock")]
    Release,

    /// Test whether the mutex is locked.
    ///
    /// Exits 0 when locked and 1 when unlocked.
    #[command(alias = "status")]
    Test(TestArgs),

    /// Refresh the timestamp of a held mutex.
    ///
    /// Long-running holders call this periodically so contenders do not
    /// reclaim the lock as dead.
    Refresh,
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug, Default)]
pub struct LockArgs {
    /// Frequency of locking attempts (e.g. 500ms).
    #[arg(long, value_parser = parse_duration, allow_hyphen_values = true)]
    pub pulse: Option<TimeDelta>,

    /// Frequency of saving the current timestamp in the lock file (e.g. 10s).
    #[arg(long, value_parser = parse_duration, allow_hyphen_values = true)]
    pub refresh: Option<TimeDelta>,

    /// Age after which the mutex is considered "dead" (e.g. 60m; <= 0 disables).
    #[arg(long, alias = "dead-age", value_parser = parse_duration, allow_hyphen_values = true)]
    pub limit: Option<TimeDelta>,

    /// Locking timeout (used if > 0).
    #[arg(long, value_parser = parse_duration, allow_hyphen_values = true)]
    pub timeout: Option<TimeDelta>,
}

/// Arguments for the `test` command.
#[derive(Parser, Debug, Default)]
pub struct TestArgs {
    /// Print the status as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_lock_minimal() {
        let cli = Cli::try_parse_from(["fmutex", "--id", "m", "lock"]).unwrap();
        assert_eq!(cli.global.id.as_deref(), Some("m"));
        if let Command::Lock(args) = cli.command {
            assert!(args.pulse.is_none());
            assert!(args.timeout.is_none());
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_full() {
        let cli = Cli::try_parse_from([
            "fmutex",
            "--root",
            "/shared",
            "--id",
            "init",
            "-s",
            "lock",
            "--pulse",
            "100ms",
            "--refresh",
            "2s",
            "--limit",
            "-1s",
            "--timeout",
            "1m",
        ])
        .unwrap();
        assert_eq!(cli.global.root, Some(PathBuf::from("/shared")));
        assert!(cli.global.silent);
        if let Command::Lock(args) = cli.command {
            assert_eq!(args.pulse, Some(TimeDelta::milliseconds(100)));
            assert_eq!(args.refresh, Some(TimeDelta::seconds(2)));
            assert_eq!(args.limit, Some(TimeDelta::seconds(-1)));
            assert_eq!(args.timeout, Some(TimeDelta::minutes(1)));
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_dead_age_alias() {
        let cli = Cli::try_parse_from(["fmutex", "lock", "--dead-age", "5m"]).unwrap();
        if let Command::Lock(args) = cli.command {
            assert_eq!(args.limit, Some(TimeDelta::minutes(5)));
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_global_options_after_command() {
        let cli = Cli::try_parse_from(["fmutex", "release", "--id", "m", "--silent"]).unwrap();
        assert!(matches!(cli.command, Command::Release));
        assert_eq!(cli.global.id.as_deref(), Some("m"));
        assert!(cli.global.silent);
    }

    #[test]
    fn parse_aliases() {
        let cli = Cli::try_parse_from(["fmutex", "unlock"]).unwrap();
        assert!(matches!(cli.command, Command::Release));

        let cli = Cli::try_parse_from(["fmutex", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Test(TestArgs { json: true })));
    }

    #[test]
    fn parse_refresh() {
        let cli = Cli::try_parse_from(["fmutex", "refresh"]).unwrap();
        assert!(matches!(cli.command, Command::Refresh));
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let result = Cli::try_parse_from(["fmutex", "lock", "--timeout", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result = Cli::try_parse_from(["fmutex", "grab"]);
        assert!(result.is_err());
    }
}
