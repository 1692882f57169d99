//! Runtime configuration.
//!
//! # Sources (lowest precedence first)
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. Optional YAML file, `<config_dir>/stampsync/config.yaml` or an explicit path.
//! 3. Command-line overrides, applied by the binary through [`Overrides`].
//!
//! # API pattern
//!
//! - `load_at(path)`: explicit file; used in tests with `TempDir`
//! - `load()`: derives the path from `dirs::config_dir()`, delegates to `load_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_EXTENSION: &str = "lsl";
pub const DEFAULT_EXTERNAL_SUFFIX: &str = "_Xed.lsl";
pub const DEFAULT_SETTLE_MS: u64 = 1_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Working directories of the tracked repositories, in search order.
    pub repositories: Vec<PathBuf>,
    /// Directory the external editor writes into. `None` → platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_dir: Option<PathBuf>,
    /// Extension of tracked files, without the dot.
    pub extension: String,
    /// File-name suffix that marks an external editor file.
    pub external_suffix: String,
    /// Delay between a create/update notification and reading the file.
    pub settle_ms: u64,
    /// Window in which repeated notifications for one path collapse.
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            external_dir: None,
            extension: DEFAULT_EXTENSION.to_string(),
            external_suffix: DEFAULT_EXTERNAL_SUFFIX.to_string(),
            settle_ms: DEFAULT_SETTLE_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repositories: Vec<PathBuf>,
    pub external_dir: Option<PathBuf>,
    pub settle_ms: Option<u64>,
}

impl Config {
    /// `<name>.<extension>`, the base name searched for in repositories.
    pub fn tracked_file_name(&self, name: &str) -> String {
        format!("{name}.{}", self.extension)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Layer `overrides` on top. Repositories given on the command line
    /// replace the configured list rather than extending it.
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if !overrides.repositories.is_empty() {
            self.repositories = overrides.repositories;
        }
        if overrides.external_dir.is_some() {
            self.external_dir = overrides.external_dir;
        }
        if let Some(settle_ms) = overrides.settle_ms {
            self.settle_ms = settle_ms;
        }
        self
    }

    /// Check that the config is runnable and fill in the external directory.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        if self.repositories.is_empty() {
            return Err(ConfigError::NoRepositories);
        }
        if self.external_dir.is_none() {
            self.external_dir = Some(default_external_dir().ok_or(ConfigError::ExternalDirUnknown)?);
        }
        Ok(self)
    }
}

/// Where the viewer's external editor feature writes its temporary scripts.
///
/// Only macOS has a known location; every other platform must configure it.
pub fn default_external_dir() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        Some(
            std::env::temp_dir()
                .join("..")
                .join("TemporaryItems")
                .join("SecondLife"),
        )
    } else {
        None
    }
}

/// `<config_dir>/stampsync/config.yaml`. Pure, no I/O.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stampsync").join("config.yaml"))
}

/// Load a config file. A missing file yields the defaults.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `load_at` convenience wrapper over [`default_config_path`].
pub fn load() -> Result<Config, ConfigError> {
    match default_config_path() {
        Some(path) => load_at(&path),
        None => Ok(Config::default()),
    }
}
