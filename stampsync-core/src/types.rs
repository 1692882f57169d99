//! Domain types shared by every stampsync crate.
//!
//! All path fields use `PathBuf`; repository-relative paths are `/`-separated
//! strings because they come out of git trees, not the filesystem.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Position of a repository in the ordered list given at startup.
///
/// Enumeration order of repositories is the order of these ids, which keeps
/// candidate search deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoId(pub usize);

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repo#{}", self.0)
    }
}

/// A full commit id as rendered by the repository backend (40 hex chars for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Working-tree state of a single tracked file relative to HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorktreeStatus {
    #[default]
    Unmodified,
    Modified,
}

impl WorktreeStatus {
    pub fn is_modified(self) -> bool {
        matches!(self, WorktreeStatus::Modified)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// An external script file split into its stamp and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub name: String,
    /// Version with any trailing dirty marker already stripped.
    pub version: String,
    pub dirty: bool,
    pub content: Vec<u8>,
}

impl ScriptRecord {
    /// The version as it appears in the stamp, dirty marker included.
    pub fn stamped_version(&self) -> String {
        crate::header::stamp_version(&self.version, self.dirty)
    }
}

/// One commit in one repository. Equal only when both halves match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCommitRef {
    pub repository: RepoId,
    pub commit: CommitId,
}

/// A file found while searching; not yet confirmed as the twin of anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub at: RepoCommitRef,
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub content: Vec<u8>,
}

/// A confirmed one-to-one correspondence, owned by the link table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LinkEntry {
    pub external_path: PathBuf,
    /// Absolute path of the working file inside the repository checkout.
    pub repo_file_path: PathBuf,
    pub repository: RepoId,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
