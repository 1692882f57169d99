// Shared git and script fixtures for integration tests.
#![allow(dead_code)]

use git2::{Repository, Signature, Time};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use stampsync_repo::GitRepo;

/// Create a temporary git repository with a configured identity.
pub fn create_test_repo() -> (TempDir, PathBuf, Repository) {
    let dir = TempDir::new().unwrap();
    let repo_path = dir.path().to_path_buf();
    let repo = Repository::init(&repo_path).unwrap();

    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    (dir, repo_path, repo)
}

/// Write files, stage them and commit on HEAD.
///
/// The signature time is fixed, so replaying the same calls in two
/// repositories yields identical commit ids.
pub fn add_commit(repo: &Repository, files: &[(&str, &[u8])], message: &str) -> String {
    let sig = Signature::new("Test User", "test@example.com", &Time::new(1_700_000_000, 0)).unwrap();
    let mut index = repo.index().unwrap();

    for (path, content) in files {
        let full_path = repo.workdir().unwrap().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }

    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());

    let oid = match parent {
        Some(parent) => repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
            .unwrap(),
        None => repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
            .unwrap(),
    };
    oid.to_string()
}

/// A repository with `commits` applied in order; returns the commit ids.
pub fn fixture(commits: &[&[(&str, &[u8])]]) -> (TempDir, Repository, Vec<String>) {
    let (dir, _path, raw) = create_test_repo();
    let ids = commits
        .iter()
        .enumerate()
        .map(|(i, files)| add_commit(&raw, files, &format!("commit {i}")))
        .collect();
    (dir, raw, ids)
}

/// Open a fixture through the query layer.
pub fn open(dir: &TempDir) -> GitRepo {
    GitRepo::open(dir.path()).unwrap()
}

/// Write an external editor script with a stamp and return its path.
pub fn write_script(dir: &Path, file: &str, name: &str, version: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(file);
    let mut bytes = format!("//{name} - {version}\n").into_bytes();
    bytes.extend_from_slice(body);
    fs::write(&path, bytes).unwrap();
    path
}
