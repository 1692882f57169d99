//! Raw `notify` events to [`WatchEvent`]s.
//!
//! Two kinds of tree are watched. The external editor directory is flat and
//! only files named `*<external_suffix>` directly inside it count. Repository
//! working directories are recursive; only files with the tracked extension
//! count, and anything under `.git` is dropped.
//!
//! | notify kind                 | event                          |
//! |-----------------------------|--------------------------------|
//! | `Create(_)`                 | create                         |
//! | `Remove(_)`                 | delete                         |
//! | `Modify(Name(From))`        | delete                         |
//! | `Modify(Name(To))`          | create                         |
//! | `Modify(Name(Both))`        | delete first path, create rest |
//! | `Modify(Name(_))`           | create if present, else delete |
//! | other `Modify(_)`           | update                         |
//! | access, other               | dropped                        |

use std::path::{Component, Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind as NotifyKind};

use stampsync_sync::{EventKind, Origin, WatchEvent};

#[derive(Debug, Clone)]
pub struct EventFilter {
    external_dir: PathBuf,
    external_suffix: String,
    extension: String,
    repo_roots: Vec<PathBuf>,
}

impl EventFilter {
    pub fn new(
        external_dir: impl Into<PathBuf>,
        external_suffix: impl Into<String>,
        extension: impl Into<String>,
        repo_roots: Vec<PathBuf>,
    ) -> Self {
        Self {
            external_dir: external_dir.into(),
            external_suffix: external_suffix.into(),
            extension: extension.into(),
            repo_roots,
        }
    }

    /// Turn one notify event into zero or more watch events.
    pub fn classify(&self, event: &Event) -> Vec<WatchEvent> {
        kinds_for(&event.kind, &event.paths)
            .into_iter()
            .filter_map(|(kind, path)| {
                self.origin_of(path)
                    .map(|origin| WatchEvent::new(kind, origin, path.clone()))
            })
            .collect()
    }

    /// Which watched tree `path` belongs to, if it is a file we track.
    pub fn origin_of(&self, path: &Path) -> Option<Origin> {
        if path.parent() == Some(self.external_dir.as_path()) {
            let is_external = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(&self.external_suffix))
                .unwrap_or(false);
            return is_external.then_some(Origin::External);
        }

        let root = self.repo_roots.iter().find(|root| path.starts_with(root))?;
        let relative = path.strip_prefix(root).ok()?;
        if relative
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == ".git"))
        {
            return None;
        }
        let tracked = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == self.extension)
            .unwrap_or(false);
        tracked.then_some(Origin::Repository)
    }
}

fn kinds_for<'a>(kind: &NotifyKind, paths: &'a [PathBuf]) -> Vec<(EventKind, &'a PathBuf)> {
    let all = |k: EventKind| paths.iter().map(|p| (k, p)).collect::<Vec<_>>();
    match kind {
        NotifyKind::Create(_) => all(EventKind::Create),
        NotifyKind::Remove(_) => all(EventKind::Delete),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) => all(EventKind::Delete),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => all(EventKind::Create),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let k = if i == 0 {
                    EventKind::Delete
                } else {
                    EventKind::Create
                };
                (k, p)
            })
            .collect(),
        NotifyKind::Modify(ModifyKind::Name(_)) => paths
            .iter()
            .map(|p| {
                let k = if p.exists() {
                    EventKind::Create
                } else {
                    EventKind::Delete
                };
                (k, p)
            })
            .collect(),
        NotifyKind::Modify(_) => all(EventKind::Update),
        _ => Vec::new(),
    }
}
