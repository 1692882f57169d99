//! `stampsync header`: print the stamp of one script.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stampsync_core::parse_header;

/// Arguments for `stampsync header`.
#[derive(Args, Debug)]
pub struct HeaderArgs {
    /// Script to read.
    pub file: PathBuf,
}

impl HeaderArgs {
    pub fn run(self) -> Result<()> {
        let bytes =
            fs::read(&self.file).with_context(|| format!("failed to read {}", self.file.display()))?;
        let record = parse_header(&bytes)
            .with_context(|| format!("unable to recognize {}", self.file.display()))?;

        println!("name:    {}", record.name);
        println!(
            "version: {}",
            if record.version.is_empty() {
                "(none)"
            } else {
                record.version.as_str()
            }
        );
        println!("dirty:   {}", if record.dirty { "yes" } else { "no" });
        Ok(())
    }
}
