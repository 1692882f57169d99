//! [`RepoQuery`] over libgit2.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, ObjectType, Oid, Repository, Sort, Status, Tree};

use stampsync_core::{CommitId, WorktreeStatus};

use crate::error::{io_err, RepoError};
use crate::query::RepoQuery;
use crate::tree::{recursive_search, TreeMatch, TreeNode};

/// A tracked repository opened from its working directory.
pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepo")
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl GitRepo {
    /// Open the repository whose checkout is at (or above) `path`.
    ///
    /// The working directory is canonicalized so that it matches the real
    /// paths filesystem notifications arrive with.
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let repo = Repository::discover(path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| RepoError::NotAWorkingTree {
                path: path.to_path_buf(),
            })?
            .to_path_buf();
        let workdir = fs::canonicalize(&workdir).map_err(|e| io_err(&workdir, e))?;
        tracing::debug!(workdir = %workdir.display(), "opened repository");
        Ok(Self { repo, workdir })
    }

    fn oid(commit: &CommitId) -> Result<Oid, RepoError> {
        Ok(Oid::from_str(commit.as_str())?)
    }
}

impl RepoQuery for GitRepo {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn resolve_commit(&self, reference: &str) -> Result<Option<CommitId>, RepoError> {
        if reference.is_empty() {
            return Ok(None);
        }
        let object = match self.repo.revparse_single(reference) {
            Ok(object) => object,
            Err(err) if is_unresolvable(&err) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match object.peel_to_commit() {
            Ok(commit) => Ok(Some(CommitId(commit.id().to_string()))),
            Err(err) if is_unresolvable(&err) || err.code() == ErrorCode::Peel => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn tree_search(&self, commit: &CommitId, file_name: &str) -> Result<Vec<TreeMatch>, RepoError> {
        let commit = self.repo.find_commit(Self::oid(commit)?)?;
        let root = GitTree {
            repo: &self.repo,
            tree: commit.tree()?,
        };
        Ok(recursive_search(&root, file_name)?)
    }

    fn commits_between(&self, from: &CommitId, to: &CommitId) -> Result<Vec<CommitId>, RepoError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(Self::oid(to)?)?;
        revwalk.hide(Self::oid(from)?)?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        let mut commits = Vec::new();
        for oid in revwalk {
            commits.push(CommitId(oid?.to_string()));
        }
        Ok(commits)
    }

    fn head_commit_id(&self) -> Result<CommitId, RepoError> {
        let head = self.repo.head()?.peel_to_commit()?;
        Ok(CommitId(head.id().to_string()))
    }

    fn working_tree_status(&self, relative: &Path) -> Result<WorktreeStatus, RepoError> {
        let status = self.repo.status_file(relative)?;
        if status.is_empty() || status == Status::IGNORED {
            Ok(WorktreeStatus::Unmodified)
        } else {
            Ok(WorktreeStatus::Modified)
        }
    }

    /// libgit2 can only reload the whole index. Status re-hashes any working
    /// file whose stat data no longer match the index, so this plus
    /// `status_file` is enough for the one path; `relative` is only logged.
    fn refresh_index(&self, relative: &Path) -> Result<(), RepoError> {
        let mut index = self.repo.index()?;
        index.read(true)?;
        tracing::trace!(path = %relative.display(), "index reloaded");
        Ok(())
    }
}

fn is_unresolvable(err: &git2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::NotFound | ErrorCode::Ambiguous | ErrorCode::InvalidSpec | ErrorCode::Invalid
    )
}

/// A libgit2 tree viewed as a [`TreeNode`].
struct GitTree<'r> {
    repo: &'r Repository,
    tree: Tree<'r>,
}

impl<'r> TreeNode for GitTree<'r> {
    type Error = git2::Error;

    fn subtrees(&self) -> Result<Vec<(String, Self)>, Self::Error> {
        let mut out = Vec::new();
        for entry in self.tree.iter() {
            if entry.kind() != Some(ObjectType::Tree) {
                continue;
            }
            let Some(name) = entry.name() else { continue };
            let tree = self.repo.find_tree(entry.id())?;
            out.push((
                name.to_string(),
                GitTree {
                    repo: self.repo,
                    tree,
                },
            ));
        }
        Ok(out)
    }

    fn blob_names(&self) -> Vec<String> {
        self.tree
            .iter()
            .filter(|entry| entry.kind() == Some(ObjectType::Blob))
            .filter_map(|entry| entry.name().map(str::to_string))
            .collect()
    }

    fn blob_content(&self, name: &str) -> Result<Vec<u8>, Self::Error> {
        let entry = self
            .tree
            .get_name(name)
            .ok_or_else(|| git2::Error::from_str(&format!("no blob named {name}")))?;
        let blob = self.repo.find_blob(entry.id())?;
        Ok(blob.content().to_vec())
    }
}
