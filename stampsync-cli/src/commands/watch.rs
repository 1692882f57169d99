//! `stampsync watch`: run the watcher in the foreground until ctrl-c.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stampsync_core::Overrides;
use stampsync_daemon::start_blocking;

use super::load_config;
use crate::LogFormatArg;

/// Arguments for `stampsync watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Repository working directories to track, in search order. Replaces
    /// the configured list when given.
    #[arg(value_name = "REPO")]
    pub repositories: Vec<PathBuf>,

    /// Directory the external editor writes its scripts into.
    #[arg(long, value_name = "DIR")]
    pub external_dir: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Delay in milliseconds before reading a changed file.
    #[arg(long, value_name = "N")]
    pub settle_ms: Option<u64>,

    /// Log output format: text or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormatArg,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?
            .apply(Overrides {
                repositories: self.repositories,
                external_dir: self.external_dir,
                settle_ms: self.settle_ms,
            })
            .resolve()
            .context("cannot start watching")?;

        start_blocking(config, self.log_format.into()).context("watcher exited with error")
    }
}
