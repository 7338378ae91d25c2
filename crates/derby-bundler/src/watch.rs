//! Watch mode: rebuild when bundled files change and tell connected
//! clients about the new scripts.
//!
//! Every successful [`App::bundle`] in watch mode replaces the app's
//! [`BundleWatcher`] with one covering exactly the files of that bundle.
//! Changes are queued on a channel that [`App::watch`] drains.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::app::App;
use crate::backend::BundleBackend;
use crate::{BundleOptions, Error, Result};

/// Window in which repeated events for the same file are dropped.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

const REFRESH_CAPACITY: usize = 16;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Watches an explicit set of files (non-recursively) and forwards changes.
pub struct BundleWatcher {
    _watcher: RecommendedWatcher,
    paths: Vec<PathBuf>,
}

impl BundleWatcher {
    /// Watch `paths`, sending debounced changes to `tx`.
    ///
    /// Paths that no longer exist are skipped rather than failing the
    /// whole watcher.
    pub fn new(
        paths: impl IntoIterator<Item = PathBuf>,
        tx: mpsc::UnboundedSender<FileChange>,
        debounce: Duration,
    ) -> Result<Self> {
        let mut last_seen: HashMap<PathBuf, Instant> = HashMap::new();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    return;
                }
            };

            for path in &event.paths {
                let now = Instant::now();
                if let Some(last) = last_seen.get(path) {
                    if now.duration_since(*last) < debounce {
                        continue;
                    }
                }

                let change = match event.kind {
                    notify::EventKind::Create(_) => FileChange::Created(path.clone()),
                    notify::EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    notify::EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                last_seen.insert(path.clone(), now);

                // Receiver gone means nobody is rebuilding anymore.
                let _ = tx.send(change);
            }
        })?;

        let mut watched = Vec::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            watcher.watch(&path, RecursiveMode::NonRecursive)?;
            watched.push(path);
        }

        Ok(Self {
            _watcher: watcher,
            paths: watched,
        })
    }

    /// Files actually being watched.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl std::fmt::Debug for BundleWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleWatcher")
            .field("paths", &self.paths)
            .finish()
    }
}

/// Sent to subscribers after a rebuild has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    ScriptsUpdated {
        app: String,
        script_url: String,
        script_hash: String,
    },
}

/// Fan-out of [`RefreshEvent`]s to connected clients.
///
/// Publishing is a no-op until the hub is enabled, which happens on the
/// first bundle in watch mode.
#[derive(Debug)]
pub struct RefreshHub {
    sender: broadcast::Sender<RefreshEvent>,
    enabled: AtomicBool,
}

impl RefreshHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(REFRESH_CAPACITY);
        Self {
            sender,
            enabled: AtomicBool::new(false),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: RefreshEvent) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for RefreshHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-app watch plumbing: the change channel and the live watcher.
///
/// Files are only watched while [`App::watch`] is running, since it is the
/// sole reader of the channel.
pub(crate) struct WatchState {
    tx: Mutex<Option<mpsc::UnboundedSender<FileChange>>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<FileChange>>>,
    watcher: Mutex<Option<BundleWatcher>>,
    active: AtomicBool,
}

impl WatchState {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            watcher: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn activate(&self) -> ActiveWatch<'_> {
        self.active.store(true, Ordering::Release);
        ActiveWatch(self)
    }
}

/// Marks a running watch loop; dropping it stops the file watcher too.
struct ActiveWatch<'a>(&'a WatchState);

impl Drop for ActiveWatch<'_> {
    fn drop(&mut self) {
        self.0.active.store(false, Ordering::Release);
        self.0.watcher.lock().take();
    }
}

impl App {
    /// Replace the current watcher with one over the files of the latest
    /// bundle. Virtual modules and other ids without a file are skipped.
    /// Does nothing unless [`App::watch`] is running.
    pub(crate) fn watch_bundle(&self, files: &[String]) -> Result<()> {
        if !self.watch_state.is_active() {
            return Ok(());
        }
        let Some(tx) = self.watch_state.tx.lock().clone() else {
            return Ok(());
        };

        let paths: BTreeSet<PathBuf> = files
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .collect();

        let watcher = BundleWatcher::new(paths, tx, DEFAULT_DEBOUNCE)?;
        tracing::debug!(
            app = %self.name(),
            files = watcher.paths().len(),
            "watching bundle files"
        );
        *self.watch_state.watcher.lock() = Some(watcher);
        Ok(())
    }

    /// Files currently watched for this app.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        self.watch_state
            .watcher
            .lock()
            .as_ref()
            .map(|w| w.paths().to_vec())
            .unwrap_or_default()
    }

    /// Queue a rebuild as if `change` had been observed on disk. Ignored
    /// unless [`App::watch`] is running.
    pub fn notify_change(&self, change: FileChange) {
        if !self.watch_state.is_active() {
            return;
        }
        if let Some(tx) = self.watch_state.tx.lock().as_ref() {
            let _ = tx.send(change);
        }
    }

    /// Stop watching. A running [`App::watch`] loop finishes its current
    /// rebuild and returns.
    pub fn stop_watching(&self) {
        self.watch_state.watcher.lock().take();
        self.watch_state.tx.lock().take();
    }

    /// Write the scripts, then rewrite them every time a bundled file
    /// changes, until [`App::stop_watching`] is called.
    ///
    /// A failed rebuild is logged and the previous scripts stay current.
    pub async fn watch(
        &self,
        backend: &dyn BundleBackend,
        dir: &Path,
        options: &BundleOptions,
    ) -> Result<()> {
        if !self.config().watch_files {
            return Err(Error::InvalidConfig(format!(
                "app '{}' is not configured to watch files",
                self.name()
            )));
        }
        let mut rx = self.watch_state.rx.lock().take().ok_or_else(|| {
            Error::InvalidConfig(format!("app '{}' is already being watched", self.name()))
        })?;
        let _active = self.watch_state.activate();

        let artifact = match self.write_scripts(backend, dir, options).await {
            Ok(artifact) => artifact,
            Err(err) => {
                *self.watch_state.rx.lock() = Some(rx);
                return Err(err);
            }
        };
        tracing::info!(app = %self.name(), url = %artifact.script_url, "watching for changes");

        while let Some(change) = rx.recv().await {
            // Coalesce whatever piled up during the last build.
            let mut pending = 1;
            while rx.try_recv().is_ok() {
                pending += 1;
            }
            tracing::info!(
                app = %self.name(),
                path = %change.path().display(),
                pending,
                "rebuilding"
            );

            match self.write_scripts(backend, dir, options).await {
                Ok(artifact) => {
                    self.refresh.publish(RefreshEvent::ScriptsUpdated {
                        app: self.name().to_string(),
                        script_url: artifact.script_url.clone(),
                        script_hash: artifact.script_hash.clone(),
                    });
                }
                Err(err) => {
                    tracing::warn!(app = %self.name(), error = %err, "rebuild failed");
                }
            }
        }

        Ok(())
    }
}
