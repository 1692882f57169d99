pub mod header;
pub mod identify;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use stampsync_core::{config, Config};

/// Load `path`, or the default config file when none is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_at(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => config::load().context("failed to load default config"),
    }
}
