//! Logging setup for the fmutex binary.
//!
//! The library logs through the `log` facade. The binary installs
//! `env_logger` with an `info` default that `RUST_LOG` can override; silent
//! mode switches logging off entirely, errors included.

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// Prefix for every log line.
pub const PROGRAM: &str = "fmutex";

/// Build the logger configuration without installing it.
pub fn builder(silent: bool) -> Builder {
    let mut builder = if silent {
        let mut builder = Builder::new();
        builder.filter_level(LevelFilter::Off);
        builder
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|buf, record| {
        if record.level() <= Level::Warn {
            writeln!(
                buf,
                "{}: {}: {}",
                PROGRAM,
                record.level().as_str().to_lowercase(),
                record.args()
            )
        } else {
            writeln!(buf, "{}: {}", PROGRAM, record.args())
        }
    });
    builder
}

/// Install the global logger. Later calls are no-ops.
pub fn init(silent: bool) {
    let _ = builder(silent).try_init();
}
