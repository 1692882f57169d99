//! The link table: external script path <-> repository working file.
//!
//! Both directions are functions at all times. Every mutation keeps the two
//! maps in step, so a reader never sees a half-applied link.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::{LinkEntry, RepoId};

#[derive(Debug, Default)]
pub struct LinkTable {
    by_external: HashMap<PathBuf, LinkEntry>,
    by_repo: HashMap<PathBuf, PathBuf>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `external_path <-> repo_file_path`, dropping any link that
    /// currently uses either path.
    pub fn link(&mut self, external_path: &Path, repo_file_path: &Path, repository: RepoId) {
        self.unlink(external_path);
        self.unlink(repo_file_path);

        self.by_repo
            .insert(repo_file_path.to_path_buf(), external_path.to_path_buf());
        self.by_external.insert(
            external_path.to_path_buf(),
            LinkEntry {
                external_path: external_path.to_path_buf(),
                repo_file_path: repo_file_path.to_path_buf(),
                repository,
            },
        );
    }

    pub fn lookup_by_external(&self, path: &Path) -> Option<&Path> {
        self.by_external
            .get(path)
            .map(|entry| entry.repo_file_path.as_path())
    }

    pub fn lookup_by_repo(&self, path: &Path) -> Option<&Path> {
        self.by_repo.get(path).map(PathBuf::as_path)
    }

    pub fn entry(&self, external_path: &Path) -> Option<&LinkEntry> {
        self.by_external.get(external_path)
    }

    /// Remove the link containing `path` on either side. Returns the removed entry.
    pub fn unlink(&mut self, path: &Path) -> Option<LinkEntry> {
        let external = if self.by_external.contains_key(path) {
            path.to_path_buf()
        } else {
            self.by_repo.get(path)?.clone()
        };
        let entry = self.by_external.remove(&external)?;
        self.by_repo.remove(&entry.repo_file_path);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_external.is_empty()
    }

    /// All links, sorted by external path.
    pub fn entries(&self) -> Vec<&LinkEntry> {
        let mut entries: Vec<&LinkEntry> = self.by_external.values().collect();
        entries.sort_by(|a, b| a.external_path.cmp(&b.external_path));
        entries
    }
}
