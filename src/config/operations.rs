//! Config loading, validation, and conversion into engine options.

use super::model::Config;
use crate::error::{MutexError, Result};
use crate::mutex::{MutexOptions, normalize_id};
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(MutexError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            MutexError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| MutexError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            MutexError::Config(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `id`, when set and not blank, must be a valid mutex id
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = self.id.as_deref()
            && !id.trim().is_empty()
        {
            normalize_id(id).map_err(|e| {
                MutexError::Config(format!("config validation failed: {}", e))
            })?;
        }
        Ok(())
    }

    /// The root directory, falling back to the system temp directory when unset or blank.
    pub fn root_dir(&self) -> PathBuf {
        self.root
            .as_ref()
            .filter(|root| !root.to_string_lossy().trim().is_empty())
            .cloned()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// The mutex id, which is required by every command.
    pub fn lock_id(&self) -> Result<&str> {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(MutexError::Config(
                "flag --id is required (or set FMUTEX_ID)".to_string(),
            )),
        }
    }

    /// Engine timings taken from this config.
    pub fn mutex_options(&self) -> MutexOptions {
        MutexOptions::new(self.pulse, self.refresh, self.dead_age)
    }
}
