//! Error types for stampsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// The first line of a file is not a stamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("no header: {reason}")]
    NoHeader { reason: &'static str },
}

/// All errors that can arise while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading a config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load. Carries the file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No external directory was configured and the platform has no default.
    #[error("cannot locate the external editor directory on this platform; pass --external-dir")]
    ExternalDirUnknown,

    /// Nothing to watch.
    #[error("no repositories configured")]
    NoRepositories,
}
