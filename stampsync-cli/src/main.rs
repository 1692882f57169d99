//! stampsync: keep external editor scripts in step with git working copies.
//!
//! # Usage
//!
//! ```text
//! stampsync watch [REPO]... [--external-dir DIR] [--config FILE] [--settle-ms N] [--log-format text|json]
//! stampsync identify FILE [--repo REPO]... [--config FILE] [--json]
//! stampsync header FILE
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{header::HeaderArgs, identify::IdentifyArgs, watch::WatchArgs};
use stampsync_daemon::LogFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stampsync",
    version,
    about = "Sync stamped external editor scripts with files in git repositories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the external editor directory and repositories in the foreground.
    Watch(WatchArgs),

    /// Show which repository file a script would link to, without linking.
    Identify(IdentifyArgs),

    /// Print the stamp of a script.
    Header(HeaderArgs),
}

// ---------------------------------------------------------------------------
// Shared LogFormat argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `LogFormat` from CLI args.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFormatArg(pub LogFormat);

impl FromStr for LogFormatArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self(LogFormat::Text)),
            "json" => Ok(Self(LogFormat::Json)),
            other => Err(format!("unknown log format '{other}'; expected: text, json")),
        }
    }
}

impl fmt::Display for LogFormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        arg.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Watch(args) => args.run(),
        Commands::Identify(args) => args.run(),
        Commands::Header(args) => args.run(),
    }
}
