//! Error types for stampsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use stampsync_core::{HeaderError, RepoId};
use stampsync_repo::RepoError;

/// Why a search did not produce exactly one file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Every strategy came back empty.
    #[error("no matches found")]
    NoMatch,

    /// The same file matched in more than one repository.
    #[error("multiple repositories matched ({repositories:?}); is a repository tracked twice?")]
    MultipleRepositories { repositories: Vec<RepoId> },

    /// More than one file in a single repository matched.
    #[error("multiple files matched in {repository}: {}", paths.join(", "))]
    MultiplePaths {
        repository: RepoId,
        paths: Vec<String>,
    },
}

impl MatchError {
    pub fn is_ambiguous(&self) -> bool {
        !matches!(self, MatchError::NoMatch)
    }
}

/// All errors that can arise while handling one watch event.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The external file has no recognizable stamp.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// Candidate search did not single out one file.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A repository query failed.
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    /// A link names a repository that is not tracked.
    #[error("unknown repository {0}")]
    UnknownRepository(RepoId),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
