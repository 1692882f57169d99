//! The capabilities the matching engine needs from a repository.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use stampsync_core::{CommitId, WorktreeStatus};

use crate::error::RepoError;
use crate::tree::TreeMatch;

/// Read-mostly view of one tracked repository.
///
/// Implementations are expected to be local and bounded; nothing here blocks
/// on the network.
pub trait RepoQuery {
    /// Root of the checkout.
    fn workdir(&self) -> &Path;

    /// Resolve `reference` (usually a full commit id) to a commit, if it names one.
    fn resolve_commit(&self, reference: &str) -> Result<Option<CommitId>, RepoError>;

    /// Every file named `file_name` in `commit`'s tree.
    fn tree_search(&self, commit: &CommitId, file_name: &str) -> Result<Vec<TreeMatch>, RepoError>;

    /// Commits reachable from `to` but not from `from`, oldest first.
    fn commits_between(&self, from: &CommitId, to: &CommitId) -> Result<Vec<CommitId>, RepoError>;

    fn head_commit_id(&self) -> Result<CommitId, RepoError>;

    /// Whether the working file at `relative` differs from HEAD.
    fn working_tree_status(&self, relative: &Path) -> Result<WorktreeStatus, RepoError>;

    /// Drop any cached index state so the next [`Self::working_tree_status`]
    /// sees commits and staging done outside this handle, and the working file
    /// at `relative` as it is on disk now.
    ///
    /// Backends may refresh more than `relative`; it must not be required to
    /// name a tracked file.
    fn refresh_index(&self, relative: &Path) -> Result<(), RepoError>;

    /// Every file named `file_name` in the checkout, with its on-disk content.
    ///
    /// Skips the `.git` directory and does not follow symlinks. Entries that
    /// cannot be read are logged and skipped; only an unreadable root fails.
    fn find_in_workdir(&self, file_name: &str) -> Result<Vec<TreeMatch>, RepoError> {
        let root = self.workdir();
        let mut found = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(RepoError::Walk {
                        path: root.to_path_buf(),
                        source,
                    })
                }
                Err(err) => {
                    tracing::warn!(
                        path = ?err.path(),
                        error = %err,
                        "skipping unreadable entry in working copy"
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != file_name {
                continue;
            }
            let content = match fs::read(entry.path()) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %err,
                        "skipping unreadable file in working copy"
                    );
                    continue;
                }
            };
            let relative = self.relative_path(entry.path())?;
            found.push(TreeMatch {
                path: slash_path(relative),
                content,
            });
        }
        Ok(found)
    }

    /// `path` relative to [`Self::workdir`].
    fn relative_path<'p>(&self, path: &'p Path) -> Result<&'p Path, RepoError> {
        path.strip_prefix(self.workdir())
            .map_err(|_| RepoError::OutsideWorkdir {
                path: path.to_path_buf(),
            })
    }

    /// Absolute working-file path for a repository-relative `/` path.
    fn absolute_path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.workdir().to_path_buf(), |acc, part| acc.join(part))
    }
}

/// Render a relative filesystem path with `/` separators, as git does.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_path_joins_components() {
        let path = Path::new("hud").join("scripts").join("door.lsl");
        assert_eq!(slash_path(&path), "hud/scripts/door.lsl");
    }
}
