use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use stampsync_core::{Config, ConfigError, LinkTable};
use stampsync_repo::{GitRepo, RepoQuery};
use stampsync_sync::{EventKind, Reconciler, WatchEvent};

use crate::classify::EventFilter;
use crate::error::{io_err, DaemonError};
use crate::logging::{init_tracing, LogFormat};

/// Timing knobs of the event loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Wait between a create/update notification and reading the file.
    pub settle: Duration,
    /// Quiet period per path; only the last notification inside it is handled.
    pub debounce: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            settle: config.settle_delay(),
            debounce: config.debounce_window(),
        }
    }
}

/// Start the runtime and block the current thread until it exits.
pub fn start_blocking(config: Config, log_format: LogFormat) -> Result<(), DaemonError> {
    init_tracing(log_format);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Watch the external editor directory and every repository until ctrl-c.
pub async fn run(config: Config) -> Result<(), DaemonError> {
    let config = config.resolve()?;
    let external_dir = config
        .external_dir
        .clone()
        .ok_or(ConfigError::ExternalDirUnknown)?;
    let external_dir = prepare_external_dir(&external_dir)?;
    let repos = open_repositories(&config.repositories)?;

    let filter = EventFilter::new(
        external_dir.clone(),
        config.external_suffix.clone(),
        config.extension.clone(),
        repos.iter().map(|repo| repo.workdir().to_path_buf()).collect(),
    );

    let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    watcher.watch(&external_dir, RecursiveMode::NonRecursive)?;
    for repo in &repos {
        watcher.watch(repo.workdir(), RecursiveMode::Recursive)?;
    }
    tracing::info!(
        external_dir = %external_dir.display(),
        repositories = repos.len(),
        "watching for changes"
    );

    let reconciler = Reconciler::new(repos, config.extension.clone());
    let settings = LoopSettings::from_config(&config);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let loop_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = event_loop(reconciler, filter, settings, event_rx, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (loop_result, signal_result) = tokio::join!(loop_handle, signal_handle);
    let reconciler = handle_join("event_loop", loop_result)?;
    handle_join("signal_handler", signal_result)?;

    drop(watcher);
    log_links(reconciler.links());
    Ok(())
}

/// Drain `event_rx` until it closes or shutdown fires.
///
/// Notifications are held per path until `settings.debounce` passes without
/// a newer one; only the latest is handled. The reconciler is moved into a
/// blocking task for each event and handed back afterwards, so exactly one
/// event is in flight. When the channel closes, everything still held is
/// handled before returning. Returns the reconciler for a final report.
pub async fn event_loop<R>(
    mut reconciler: Reconciler<R>,
    filter: EventFilter,
    settings: LoopSettings,
    mut event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<Reconciler<R>, DaemonError>
where
    R: RepoQuery + Send + 'static,
{
    let mut pending = HashMap::<PathBuf, Pending>::new();

    loop {
        let wake = next_due(&pending);
        tokio::select! {
            _ = shutdown_rx.recv() => {
                if !pending.is_empty() {
                    tracing::debug!(pending = pending.len(), "dropping unsettled events");
                }
                break;
            }
            event = event_rx.recv() => {
                match event {
                    Some(Ok(event)) => {
                        let now = Instant::now();
                        for watch_event in filter.classify(&event) {
                            hold(&mut pending, watch_event, now, settings.debounce);
                        }
                    }
                    Some(Err(err)) => tracing::warn!(error = %err, "watcher event error"),
                    None => {
                        for watch_event in take_all(&mut pending) {
                            reconciler = dispatch(reconciler, watch_event, settings.settle).await?;
                        }
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                for watch_event in take_due(&mut pending, Instant::now()) {
                    reconciler = dispatch(reconciler, watch_event, settings.settle).await?;
                }
            }
        }
    }

    Ok(reconciler)
}

/// Settle, then handle one event on the blocking pool.
async fn dispatch<R>(
    reconciler: Reconciler<R>,
    event: WatchEvent,
    settle: Duration,
) -> Result<Reconciler<R>, DaemonError>
where
    R: RepoQuery + Send + 'static,
{
    if event.kind != EventKind::Delete && !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }
    let (reconciler, _outcome) = tokio::task::spawn_blocking(move || {
        let mut reconciler = reconciler;
        let outcome = reconciler.handle(&event);
        (reconciler, outcome)
    })
    .await
    .map_err(|err| DaemonError::Protocol(format!("reconcile task join error: {err}")))?;
    Ok(reconciler)
}

fn open_repositories(paths: &[PathBuf]) -> Result<Vec<GitRepo>, DaemonError> {
    let mut repos = Vec::with_capacity(paths.len());
    for path in paths {
        let repo = GitRepo::open(path)?;
        tracing::info!(repository = %repo.workdir().display(), "tracking repository");
        repos.push(repo);
    }
    Ok(repos)
}

fn prepare_external_dir(dir: &Path) -> Result<PathBuf, DaemonError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    // FSEvents reports real paths (/private/var/... on macOS).
    Ok(fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()))
}

/// Upper bound on how long a path that keeps changing is held back.
const MAX_HOLD: Duration = Duration::from_secs(30);

/// The latest notification for one path, waiting for its window to close.
#[derive(Debug)]
struct Pending {
    event: WatchEvent,
    first_seen: Instant,
    due: Instant,
}

/// Hold `event` until `window` passes with no newer notification for the
/// same path. A newer event replaces the held one and pushes the deadline
/// back, up to [`MAX_HOLD`] after the first.
fn hold(pending: &mut HashMap<PathBuf, Pending>, event: WatchEvent, now: Instant, window: Duration) {
    let first_seen = match pending.get(&event.path) {
        Some(previous) => {
            tracing::trace!(path = %event.path.display(), "superseded");
            previous.first_seen
        }
        None => now,
    };
    let due = (now + window).min(first_seen + MAX_HOLD);
    pending.insert(
        event.path.clone(),
        Pending {
            event,
            first_seen,
            due,
        },
    );
}

fn next_due(pending: &HashMap<PathBuf, Pending>) -> Option<Instant> {
    pending.values().map(|p| p.due).min()
}

/// Remove and return every event whose window has closed, oldest deadline first.
fn take_due(pending: &mut HashMap<PathBuf, Pending>, now: Instant) -> Vec<WatchEvent> {
    let ready: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, p)| p.due <= now)
        .map(|(path, _)| path.clone())
        .collect();
    let mut due: Vec<Pending> = ready
        .iter()
        .filter_map(|path| pending.remove(path))
        .collect();
    due.sort_by_key(|p| p.due);
    due.into_iter().map(|p| p.event).collect()
}

fn take_all(pending: &mut HashMap<PathBuf, Pending>) -> Vec<WatchEvent> {
    let mut all: Vec<Pending> = pending.drain().map(|(_, p)| p).collect();
    all.sort_by_key(|p| p.due);
    all.into_iter().map(|p| p.event).collect()
}

fn handle_join<T>(
    task: &str,
    result: Result<Result<T, DaemonError>, tokio::task::JoinError>,
) -> Result<T, DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn log_links(links: &LinkTable) {
    tracing::info!(links = links.len(), "stopped");
    for entry in links.entries() {
        tracing::info!(
            external = %entry.external_path.display(),
            repo_file = %entry.repo_file_path.display(),
            repository = %entry.repository,
            "linked at shutdown"
        );
    }
}
