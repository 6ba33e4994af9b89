//! Command implementations for fmutex.
//!
//! This module resolves the effective configuration (flags over environment
//! over config file over defaults) and routes each CLI command to the
//! mutex operations.

use crate::cli::{Command, GlobalArgs, LockArgs, TestArgs};
use chrono::SecondsFormat;
use fmutex::config::Config;
use fmutex::error::{MutexError, Result};
use fmutex::exit_codes;
use fmutex::mutex::{self, FileMutex};
use log::{debug, info};


/// Build the effective configuration for a command.
///
/// Flags and environment variables (resolved by clap) override the config
/// file; the config file overrides built-in defaults.
pub fn resolve_config(global: &GlobalArgs, command: &Command) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(root) = global.root.as_ref().filter(|r| !r.as_os_str().is_empty()) {
        config.root = Some(root.clone());
    }
    if let Some(id) = global.id.as_ref().filter(|id| !id.trim().is_empty()) {
        config.id = Some(id.clone());
    }
    config.silent |= global.silent;

    if let Command::Lock(args) = command {
        apply_lock_overrides(&mut config, args);
    }

    config.validate()?;
    Ok(config)
}

fn apply_lock_overrides(config: &mut Config, args: &LockArgs) {
    if let Some(pulse) = args.pulse {
        config.pulse = pulse;
    }
    if let Some(refresh) = args.refresh {
        config.refresh = refresh;
    }
    if let Some(limit) = args.limit {
        config.dead_age = limit;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
}

/// Dispatch a command to its implementation.
///
/// Returns the process exit code on success; `test` reports an unlocked
/// mutex through its exit code rather than an error.
pub fn dispatch(command: Command, config: &Config) -> Result<i32> {
    match command {
        Command::Lock(_) => cmd_lock(config),
        Command::Release => cmd_release(config),
        Command::Test(args) => cmd_test(config, &args),
        Command::Refresh => cmd_refresh(config),
    }
}

fn cmd_lock(config: &Config) -> Result<i32> {
    let id = config.lock_id()?;
    let mutex = FileMutex::with_options(config.root_dir(), id, config.mutex_options())?;
    debug!(
        "locking mutex '{}' (pulse {:?}, refresh {:?}, dead age {:?})",
        mutex.id(),
        mutex.pulse(),
        mutex.refresh(),
        mutex.dead_age()
    );

    mutex.try_lock(config.timeout)?;

    if !config.silent {
        println!("LOCKED");
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_release(config: &Config) -> Result<i32> {
    let id = config.lock_id()?;
    mutex::release(config.root_dir(), id)?;

    if !config.silent {
        println!("RELEASED");
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_test(config: &Config, args: &TestArgs) -> Result<i32> {
    let id = config.lock_id()?;
    let status = mutex::status(config.root_dir(), id)?;

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| MutexError::Io(format!("failed to serialize status: {}", e)))?;
        println!("{}", json);
    } else {
        info!("{}", status);
    }

    Ok(if status.is_locked() {
        exit_codes::SUCCESS
    } else {
        exit_codes::NOT_LOCKED
    })
}

fn cmd_refresh(config: &Config) -> Result<i32> {
    let id = config.lock_id()?;
    let refreshed = mutex::refresh(config.root_dir(), id)?;

    if !config.silent {
        println!(
            "REFRESHED {}",
            refreshed.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
    Ok(exit_codes::SUCCESS)
}
