use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, Instant};

use super::types::ScheduleError;
use crate::config::extension_allowed;

/// Debounce phases. Every burst of events goes Idle -> ChangeDetected ->
/// Debouncing -> Applying -> Idle exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Idle,
    ChangeDetected,
    Debouncing,
    Applying,
}

/// Collapses bursts of filesystem events into a single apply
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    phase: WatchPhase,
    pending: Option<PathBuf>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            phase: WatchPhase::Idle,
            pending: None,
            deadline: None,
        }
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    /// When the pending change becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Register an event; the latest path wins and the quiet period restarts
    pub fn record(&mut self, path: PathBuf, now: Instant) {
        self.phase = match self.phase {
            WatchPhase::Idle => WatchPhase::ChangeDetected,
            WatchPhase::ChangeDetected | WatchPhase::Debouncing => WatchPhase::Debouncing,
            // Picked up again by `finish`
            WatchPhase::Applying => WatchPhase::Applying,
        };
        self.pending = Some(path);
        self.deadline = Some(now + self.window);
    }

    /// Move to `Applying` and hand out the path once the window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<PathBuf> {
        if !matches!(self.phase, WatchPhase::ChangeDetected | WatchPhase::Debouncing) {
            return None;
        }
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.phase = WatchPhase::Applying;
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Leave `Applying`. Events recorded meanwhile start a new cycle.
    pub fn finish(&mut self) {
        self.phase = if self.pending.is_some() {
            WatchPhase::ChangeDetected
        } else {
            WatchPhase::Idle
        };
    }

    /// Take whatever is pending, regardless of the window
    fn flush(&mut self) -> Option<PathBuf> {
        self.deadline = None;
        self.phase = WatchPhase::Idle;
        self.pending.take()
    }
}

/// Drive a [`Debouncer`] from a channel of changed paths, calling `apply` once
/// per settled burst. Returns when the channel closes.
pub async fn run_debounce_loop<F, Fut>(
    mut events: UnboundedReceiver<PathBuf>,
    window: Duration,
    mut apply: F,
) where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut debouncer = Debouncer::new(window);

    loop {
        let next = match debouncer.deadline() {
            Some(deadline) => tokio::select! {
                event = events.recv() => Some(event),
                _ = sleep_until(deadline) => None,
            },
            None => Some(events.recv().await),
        };

        match next {
            Some(Some(path)) => {
                debouncer.record(path, Instant::now());
                tracing::debug!(phase = ?debouncer.phase(), "file change recorded");
            }
            Some(None) => {
                if let Some(path) = debouncer.flush() {
                    apply(path).await;
                }
                break;
            }
            None => {
                if let Some(path) = debouncer.poll(Instant::now()) {
                    tracing::debug!(path = %path.display(), "applying file change");
                    apply(path).await;
                    debouncer.finish();
                }
            }
        }
    }
}

/// Decides which raw filesystem events matter
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    storage_dir: PathBuf,
    extensions: Vec<String>,
    followed: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ChangeFilter {
    pub fn new(storage_dir: PathBuf, extensions: Vec<String>) -> Self {
        ChangeFilter {
            storage_dir,
            extensions,
            followed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn follow(&self, path: PathBuf) {
        if let Ok(mut followed) = self.followed.lock() {
            followed.insert(path);
        }
    }

    fn is_followed(&self, path: &Path) -> bool {
        self.followed
            .lock()
            .map(|f| f.contains(path))
            .unwrap_or(false)
    }

    /// Paths of `event` that should trigger a reload
    pub fn relevant_paths(&self, event: &Event) -> Vec<PathBuf> {
        let interesting = match event.kind {
            EventKind::Create(_) => true,
            EventKind::Modify(ModifyKind::Metadata(_)) => false,
            EventKind::Modify(_) => true,
            _ => false,
        };
        if !interesting {
            return Vec::new();
        }

        event
            .paths
            .iter()
            .filter(|path| self.accepts(path))
            .cloned()
            .collect()
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        // Office lock and temp files
        if name.starts_with("~$") || name.starts_with(".~lock") {
            return false;
        }
        if !extension_allowed(path, &self.extensions) {
            return false;
        }
        path.parent() == Some(self.storage_dir.as_path()) || self.is_followed(path)
    }
}

/// Watches the storage directory (and any followed file) and feeds the
/// debounce loop
pub struct FileWatcher {
    watcher: Mutex<RecommendedWatcher>,
    filter: ChangeFilter,
}

impl FileWatcher {
    /// Start watching `storage_dir`. Must be called from within a tokio runtime.
    pub fn start<F, Fut>(
        storage_dir: &Path,
        extensions: Vec<String>,
        window: Duration,
        apply: F,
    ) -> Result<Self, ScheduleError>
    where
        F: FnMut(PathBuf) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let storage_dir = storage_dir.canonicalize()?;
        let filter = ChangeFilter::new(storage_dir.clone(), extensions);
        let (tx, rx): (UnboundedSender<PathBuf>, UnboundedReceiver<PathBuf>) = unbounded_channel();

        let event_filter = filter.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for path in event_filter.relevant_paths(&event) {
                        let _ = tx.send(path);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "file watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&storage_dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %storage_dir.display(), debounce_ms = window.as_millis() as u64, "watching storage directory");

        tokio::spawn(run_debounce_loop(rx, window, apply));

        Ok(FileWatcher {
            watcher: Mutex::new(watcher),
            filter,
        })
    }

    /// Also watch a file living outside the storage directory
    pub fn follow(&self, path: &Path) -> Result<(), ScheduleError> {
        let path = path.canonicalize()?;
        if path.parent() == Some(self.filter.storage_dir.as_path()) {
            return Ok(());
        }
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.clone());

        let mut watcher = self
            .watcher
            .lock()
            .map_err(|_| ScheduleError::Watch(notify::Error::generic("watcher lock poisoned")))?;
        watcher.watch(&parent, RecursiveMode::NonRecursive)?;
        tracing::info!(file = %path.display(), "following active file");
        self.filter.follow(path);
        Ok(())
    }
}
