//! Fast-forward writes across a link.
//!
//! ## `atomic_write` protocol
//!
//! 1. Compare the bytes to write with what is already on disk (caller).
//! 2. Write to `<path>.stampsync.tmp`.
//! 3. Rename to the final path (atomic on POSIX).
//! 4. On rename failure, remove the tmp file and leave the original intact.

use std::fs;
use std::path::{Path, PathBuf};

use stampsync_core::render_header;

use crate::error::{io_err, SyncError};

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was rewritten.
    Written { path: PathBuf },
    /// Nothing to do; the target already holds the current truth.
    Unchanged { path: PathBuf },
}

impl WriteResult {
    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::Unchanged { path } => path,
        }
    }
}

/// Which side of a link is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The external script was edited; overwrite the repository working file.
    ExternalToRepo,
    /// The repository moved on; restamp and refill the external script.
    RepoToExternal,
}

/// One side of a link as seen right now.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Stamped version, dirty marker included. Ignored on the repository side
    /// when pushing external edits, since working files carry no stamp.
    pub version: &'a str,
    pub content: &'a [u8],
}

/// Bring `target` up to date with the fresher side of a link.
///
/// `local` is the external script, `remote` the repository working file.
///
/// - [`Direction::ExternalToRepo`] writes `local.content` verbatim to
///   `target` when it differs from `remote.content`.
/// - [`Direction::RepoToExternal`] writes `//<name> - <remote.version>`
///   followed by `remote.content` to `target` when either the version or the
///   body differs from `local`.
///
/// Versions are opaque; only equality matters.
pub fn reconcile(
    direction: Direction,
    name: &str,
    local: Snapshot<'_>,
    remote: Snapshot<'_>,
    target: &Path,
) -> Result<WriteResult, SyncError> {
    let unchanged = || WriteResult::Unchanged {
        path: target.to_path_buf(),
    };

    match direction {
        Direction::ExternalToRepo => {
            if local.content == remote.content {
                tracing::debug!(path = %target.display(), "repository file already current");
                return Ok(unchanged());
            }
            atomic_write(target, local.content)?;
            tracing::info!(path = %target.display(), "pushed external edit to working copy");
        }
        Direction::RepoToExternal => {
            if local.version == remote.version && local.content == remote.content {
                tracing::debug!(path = %target.display(), "external file already current");
                return Ok(unchanged());
            }
            let bytes = render_header(name, remote.version, remote.content);
            atomic_write(target, &bytes)?;
            tracing::info!(
                path = %target.display(),
                from = local.version,
                to = remote.version,
                "fast-forwarded external file"
            );
        }
    }

    Ok(WriteResult::Written {
        path: target.to_path_buf(),
    })
}

/// Atomically replace `path` with `content`.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}.stampsync.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &[u8], tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    fn snap<'a>(version: &'a str, content: &'a [u8]) -> Snapshot<'a> {
        Snapshot { version, content }
    }

    #[test]
    fn repo_to_external_writes_header_and_working_content() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("door_Xed.lsl");
        fs::write(&target, b"//door - c1\nold").unwrap();

        let result = reconcile(
            Direction::RepoToExternal,
            "door",
            snap("c1", b"old"),
            snap("c2", b"new"),
            &target,
        )
        .unwrap();

        assert!(result.was_written());
        assert_eq!(fs::read(&target).unwrap(), b"//door - c2\nnew");
    }

    #[test]
    fn version_change_alone_triggers_restamp() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("door_Xed.lsl");

        let result = reconcile(
            Direction::RepoToExternal,
            "door",
            snap("c1", b"same"),
            snap("c1+", b"same"),
            &target,
        )
        .unwrap();

        assert!(result.was_written());
        assert_eq!(fs::read(&target).unwrap(), b"//door - c1+\nsame");
    }

    #[test]
    fn identical_pair_is_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("door_Xed.lsl");
        fs::write(&target, b"//door - c1\nbody").unwrap();
        let mtime_1 = fs::metadata(&target).unwrap().modified().unwrap();

        sleep(Duration::from_millis(1100));
        let result = reconcile(
            Direction::RepoToExternal,
            "door",
            snap("c1", b"body"),
            snap("c1", b"body"),
            &target,
        )
        .unwrap();

        assert!(matches!(result, WriteResult::Unchanged { .. }));
        let mtime_2 = fs::metadata(&target).unwrap().modified().unwrap();
        assert_eq!(mtime_2, mtime_1, "mtime changed; file was rewritten");
    }

    #[test]
    fn external_to_repo_writes_body_verbatim() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("door.lsl");
        fs::write(&target, b"old\n").unwrap();

        let result = reconcile(
            Direction::ExternalToRepo,
            "door",
            snap("c1+", b"edited\r\n"),
            snap("", b"old\n"),
            &target,
        )
        .unwrap();

        assert!(result.was_written());
        assert_eq!(fs::read(&target).unwrap(), b"edited\r\n");
    }

    #[test]
    fn external_to_repo_ignores_versions() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("door.lsl");

        let result = reconcile(
            Direction::ExternalToRepo,
            "door",
            snap("c1+", b"same"),
            snap("c9", b"same"),
            &target,
        )
        .unwrap();

        assert_eq!(result, WriteResult::Unchanged { path: target.clone() });
        assert!(!target.exists());
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.lsl");
        atomic_write(&path, b"data").unwrap();
        let tmp_path = PathBuf::from(format!("{}.stampsync.tmp", path.display()));
        assert!(!tmp_path.exists(), ".stampsync.tmp must be cleaned up");
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();

        let path = readonly_dir.join("door.lsl");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("door.lsl.stampsync.tmp");

        let err = atomic_write_with_tmp(&path, b"new content", &tmp_path);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Running as root bypasses directory permissions.
        if err.is_ok() {
            return;
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!tmp_path.exists(), ".stampsync.tmp should be cleaned up");
    }
}
