use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the watch runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("repository error: {0}")]
    Repo(#[from] stampsync_repo::RepoError),

    #[error("config error: {0}")]
    Config(#[from] stampsync_core::ConfigError),

    #[error("daemon runtime error: {0}")]
    Protocol(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampsync_core::ConfigError;

    #[test]
    fn io_errors_name_the_path() {
        let err = io_err(
            "/tmp/SecondLife",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error at /tmp/SecondLife: denied");
    }

    #[test]
    fn config_errors_convert() {
        let err: DaemonError = ConfigError::ExternalDirUnknown.into();
        assert!(matches!(err, DaemonError::Config(_)));
        assert!(err.to_string().starts_with("config error: "));
    }
}
