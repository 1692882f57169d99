//! Per-event reconciliation entrypoint used by the daemon.
//!
//! [`Reconciler::handle`] takes one watch event to completion and never
//! returns an error: failures are logged with the offending path and
//! reported as [`Outcome::Failed`]. A new link is only recorded once the
//! initial fast-forward of the external script has been written.

use std::fs;
use std::path::{Path, PathBuf};

use stampsync_core::{parse_header, stamp_version, LinkEntry, LinkTable, RepoId, ScriptRecord};
use stampsync_repo::RepoQuery;

use crate::error::{io_err, SyncError};
use crate::search::{find_candidates, select_unique, SearchRequest};
use crate::writer::{reconcile, Direction, Snapshot, WriteResult};

/// Which watched tree an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The external editor directory.
    External,
    /// A repository working directory.
    Repository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub origin: Origin,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: EventKind, origin: Origin, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            origin,
            path: path.into(),
        }
    }
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new link was established; `write` is the initial fast-forward.
    Linked {
        entry: LinkEntry,
        at_head: bool,
        write: WriteResult,
    },
    /// External edits were copied into the repository working file.
    PushedToRepo { path: PathBuf },
    /// The external file was restamped and/or refilled.
    FastForwarded { path: PathBuf },
    /// Both sides of an existing link were already in step.
    Unchanged { path: PathBuf },
    /// A delete removed a link.
    Unlinked { entry: LinkEntry },
    /// The path is not linked and the event needs no search.
    Ignored { path: PathBuf },
    /// The event was abandoned; the reason has been logged.
    Failed { path: PathBuf, reason: String },
}

/// Owns the tracked repositories and the link table.
#[derive(Debug)]
pub struct Reconciler<R> {
    repos: Vec<R>,
    links: LinkTable,
    extension: String,
}

impl<R: RepoQuery> Reconciler<R> {
    /// `repos` order is the search order; `extension` is the tracked file
    /// extension without the dot.
    pub fn new(repos: Vec<R>, extension: impl Into<String>) -> Self {
        Self {
            repos,
            links: LinkTable::new(),
            extension: extension.into(),
        }
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn repos(&self) -> &[R] {
        &self.repos
    }

    /// Handle one event to completion.
    pub fn handle(&mut self, event: &WatchEvent) -> Outcome {
        let path = event.path.as_path();
        let result = match (event.origin, event.kind) {
            (Origin::External, EventKind::Delete) => Ok(self.forget(path)),
            (Origin::External, _) => self.external_changed(path),
            (Origin::Repository, EventKind::Delete) => Ok(self.forget(path)),
            (Origin::Repository, _) => self.repo_changed(path),
        };

        match result {
            Ok(outcome) => {
                log_outcome(&outcome);
                outcome
            }
            Err(err) => {
                match &err {
                    SyncError::Header(_) => tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "unable to recognize file"
                    ),
                    SyncError::Match(m) if m.is_ambiguous() => tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "ambiguous match; not linking"
                    ),
                    SyncError::Match(_) => tracing::warn!(
                        path = %path.display(),
                        "no matches found"
                    ),
                    _ => tracing::error!(
                        path = %path.display(),
                        error = %err,
                        "failed to reconcile"
                    ),
                }
                Outcome::Failed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// A delete on either side drops the link in both directions.
    fn forget(&mut self, path: &Path) -> Outcome {
        match self.links.unlink(path) {
            Some(entry) => Outcome::Unlinked { entry },
            None => Outcome::Ignored {
                path: path.to_path_buf(),
            },
        }
    }

    /// An external script was created or saved.
    fn external_changed(&mut self, path: &Path) -> Result<Outcome, SyncError> {
        let bytes = fs::read(path).map_err(|e| io_err(path, e))?;
        let record = parse_header(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            name = %record.name,
            version = %record.version,
            dirty = record.dirty,
            "recognized external script"
        );

        if let Some(repo_file) = self.links.lookup_by_external(path) {
            let repo_file = repo_file.to_path_buf();
            return self.push_to_repo(&record, &repo_file);
        }

        self.link_new(path, &record)
    }

    fn push_to_repo(&self, record: &ScriptRecord, repo_file: &Path) -> Result<Outcome, SyncError> {
        let working = fs::read(repo_file).map_err(|e| io_err(repo_file, e))?;
        let write = reconcile(
            Direction::ExternalToRepo,
            &record.name,
            Snapshot {
                version: &record.stamped_version(),
                content: &record.content,
            },
            Snapshot {
                version: "",
                content: &working,
            },
            repo_file,
        )?;
        Ok(match write {
            WriteResult::Written { path } => Outcome::PushedToRepo { path },
            WriteResult::Unchanged { path } => Outcome::Unchanged { path },
        })
    }

    /// Search for the twin of an unlinked script and, on a unique match,
    /// fast-forward the script and link it.
    fn link_new(&mut self, path: &Path, record: &ScriptRecord) -> Result<Outcome, SyncError> {
        let file_name = format!("{}.{}", record.name, self.extension);
        let search = find_candidates(
            &self.repos,
            &SearchRequest {
                file_name: &file_name,
                version: &record.version,
                content: &record.content,
                dirty: record.dirty,
            },
        )?;
        let strategy = search.strategy;
        let candidate = select_unique(search.candidates)?;

        let repository = candidate.at.repository;
        let repo = self.repo(repository)?;
        let relative = PathBuf::from(&candidate.path);
        let repo_file = repo.absolute_path(&candidate.path);

        let head = repo.head_commit_id()?;
        let at_head = head == candidate.at.commit;
        repo.refresh_index(&relative)?;
        let status = repo.working_tree_status(&relative)?;
        let working = fs::read(&repo_file).map_err(|e| io_err(&repo_file, e))?;

        let new_version = stamp_version(head.as_str(), status.is_modified());
        let write = reconcile(
            Direction::RepoToExternal,
            &record.name,
            Snapshot {
                version: &record.stamped_version(),
                content: &record.content,
            },
            Snapshot {
                version: &new_version,
                content: &working,
            },
            path,
        )?;

        self.links.link(path, &repo_file, repository);
        tracing::info!(
            path = %path.display(),
            repo_file = %repo_file.display(),
            commit = %candidate.at.commit,
            strategy = ?strategy,
            at_head,
            "file contents matched; external script and repository linked"
        );
        Ok(Outcome::Linked {
            entry: LinkEntry {
                external_path: path.to_path_buf(),
                repo_file_path: repo_file,
                repository,
            },
            at_head,
            write,
        })
    }

    /// A tracked working file changed; restamp its linked script.
    fn repo_changed(&self, path: &Path) -> Result<Outcome, SyncError> {
        let linked = self
            .links
            .lookup_by_repo(path)
            .and_then(|external| self.links.entry(external))
            .cloned();
        let Some(entry) = linked else {
            return Ok(Outcome::Ignored {
                path: path.to_path_buf(),
            });
        };
        let repo = self.repo(entry.repository)?;
        let relative = repo.relative_path(path)?.to_path_buf();

        repo.refresh_index(&relative)?;
        let head = repo.head_commit_id()?;
        let status = repo.working_tree_status(&relative)?;
        let new_version = stamp_version(head.as_str(), status.is_modified());

        let external = &entry.external_path;
        let bytes = fs::read(external).map_err(|e| io_err(external, e))?;
        let record = parse_header(&bytes)?;
        let working = fs::read(path).map_err(|e| io_err(path, e))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.name.clone());
        let write = reconcile(
            Direction::RepoToExternal,
            &name,
            Snapshot {
                version: &record.stamped_version(),
                content: &record.content,
            },
            Snapshot {
                version: &new_version,
                content: &working,
            },
            external,
        )?;
        Ok(match write {
            WriteResult::Written { path } => Outcome::FastForwarded { path },
            WriteResult::Unchanged { path } => Outcome::Unchanged { path },
        })
    }

    fn repo(&self, id: RepoId) -> Result<&R, SyncError> {
        self.repos.get(id.0).ok_or(SyncError::UnknownRepository(id))
    }
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Linked { .. } | Outcome::PushedToRepo { .. } | Outcome::FastForwarded { .. } => {}
        Outcome::Unchanged { path } => {
            tracing::debug!(path = %path.display(), "already in step")
        }
        Outcome::Unlinked { entry } => tracing::info!(
            path = %entry.external_path.display(),
            repo_file = %entry.repo_file_path.display(),
            "link removed"
        ),
        Outcome::Ignored { path } => tracing::debug!(path = %path.display(), "not linked; ignored"),
        Outcome::Failed { .. } => {}
    }
}
