//! Error types for stampsync-repo.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from repository queries.
#[derive(Debug, Error)]
pub enum RepoError {
    /// An error reported by libgit2.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A working-copy walk failed part way.
    #[error("walk error under {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The repository is bare; there is no checkout to sync with.
    #[error("repository at {path} has no working tree")]
    NotAWorkingTree { path: PathBuf },

    /// A path handed to the repository does not live under its working tree.
    #[error("{path} is outside the repository working tree")]
    OutsideWorkdir { path: PathBuf },
}

/// Convenience constructor for [`RepoError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RepoError {
    RepoError::Io {
        path: path.into(),
        source,
    }
}
