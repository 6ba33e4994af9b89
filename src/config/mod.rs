//! Configuration model for fmutex.
//!
//! This module defines the Config struct backing the optional YAML config
//! file, with sensible defaults for every field and Go-style duration values
//! (`500ms`, `10s`, `60m`). Command-line flags and environment variables
//! override what the file sets.

mod duration;
mod model;
mod operations;


// Re-export public API
pub use duration::{format_duration, parse_duration};
pub use model::Config;
