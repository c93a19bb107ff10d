//! Filesystem-driven incremental re-indexing.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, sleep_until};

use crate::indexing::IconIndex;

use super::debouncer::ChangeBatcher;
use super::error::WatchError;
use super::notifications::{IconEvent, NotificationBroadcaster};

/// Watches the workspace and feeds changes into a shared [`IconIndex`].
///
/// Creates and modifications are debounced into batches by a
/// [`ChangeBatcher`]; deletions bypass it and are applied immediately. One
/// batch is processed at a time on the calling task.
pub struct IconWatcher {
    index: Arc<RwLock<IconIndex>>,
    batcher: ChangeBatcher,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// `None` when events are fed in by the caller.
    watcher: Option<notify::RecommendedWatcher>,
    broadcaster: Arc<NotificationBroadcaster>,
    roots: Vec<PathBuf>,
}

impl IconWatcher {
    pub fn builder() -> IconWatcherBuilder {
        IconWatcherBuilder::new()
    }

    /// Run until the event channel closes.
    pub async fn watch(self) -> Result<(), WatchError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until `shutdown` resolves or the event channel closes.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), WatchError> {
        self.watch_roots()?;
        crate::log_event!("watcher", "started", "{} roots", self.roots.len());

        tokio::pin!(shutdown);
        loop {
            let deadline = self.batcher.deadline();

            tokio::select! {
                res = self.event_rx.recv() => match res {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                    None => {
                        crate::debug_event!("watcher", "event channel closed");
                        return if self.watcher.is_some() {
                            Err(WatchError::ChannelClosed)
                        } else {
                            Ok(())
                        };
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.process_batch().await;
                }

                _ = &mut shutdown => {
                    crate::log_event!("watcher", "stopped");
                    return Ok(());
                }
            }
        }
    }

    fn watch_roots(&mut self) -> Result<(), WatchError> {
        let Some(watcher) = self.watcher.as_mut() else {
            return Ok(());
        };
        let mut watched = 0;
        for root in &self.roots {
            if !root.exists() {
                crate::debug_event!("watcher", "missing root", "{}", root.display());
                continue;
            }
            match watcher.watch(root, RecursiveMode::Recursive) {
                Ok(()) => {
                    watched += 1;
                    crate::debug_event!("watcher", "watching", "{}", root.display());
                }
                Err(e) => crate::warn_event!("watcher", "failed to watch {}: {e}", root.display()),
            }
        }
        if watched == 0 {
            return Err(WatchError::PathWatchFailed {
                path: self.roots.first().cloned().unwrap_or_default(),
                reason: "no watchable roots".to_string(),
            });
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: Event) {
        let removal = match event.kind {
            EventKind::Remove(_) => true,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => true,
            EventKind::Create(_) | EventKind::Modify(_) => false,
            _ => return,
        };

        for path in event.paths {
            if !self.index.read().await.is_relevant(&path).await {
                crate::debug_event!("watcher", "unmatched", "{:?} {}", event.kind, path.display());
                continue;
            }
            if removal {
                self.batcher.remove(&path);
                self.process_deletion(&path).await;
            } else {
                self.batcher.record(path, Instant::now());
            }
        }
    }

    async fn process_deletion(&self, path: &Path) {
        let summary = self
            .index
            .write()
            .await
            .process_changes(&[path.to_path_buf()])
            .await;
        if !summary.removed.is_empty() {
            crate::log_event!("watcher", "deleted", "{}", path.display());
        }
    }

    async fn process_batch(&mut self) {
        let Some(paths) = self.batcher.poll(Instant::now()) else {
            return;
        };
        crate::debug_event!("watcher", "processing", "{} paths", paths.len());

        let summary = self.index.write().await.process_changes(&paths).await;
        if summary.failed > 0 {
            crate::warn_event!("watcher", "{} files could not be re-indexed", summary.failed);
        }
        crate::log_event!(
            "watcher",
            "batch",
            "{} reindexed, {} removed",
            summary.reindexed.len(),
            summary.removed.len()
        );

        self.broadcaster.send(IconEvent::BatchProcessed { paths });
        self.batcher.finish(Instant::now());
    }
}

/// Builder for an [`IconWatcher`].
pub struct IconWatcherBuilder {
    index: Option<Arc<RwLock<IconIndex>>>,
    broadcaster: Option<Arc<NotificationBroadcaster>>,
    roots: Vec<PathBuf>,
    debounce_ms: u64,
}

impl IconWatcherBuilder {
    pub fn new() -> Self {
        Self {
            index: None,
            broadcaster: None,
            roots: Vec::new(),
            debounce_ms: 800,
        }
    }

    pub fn index(mut self, index: Arc<RwLock<IconIndex>>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn broadcaster(mut self, broadcaster: Arc<NotificationBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Directories to watch recursively.
    pub fn roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Build with a native filesystem watcher.
    pub fn build(self) -> Result<IconWatcher, WatchError> {
        let (tx, rx) = mpsc::channel(256);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;
        self.assemble(rx, Some(watcher))
    }

    /// Build over a caller-supplied event stream, without touching the filesystem.
    pub fn build_with_events(
        self,
        events: mpsc::Receiver<notify::Result<Event>>,
    ) -> Result<IconWatcher, WatchError> {
        self.assemble(events, None)
    }

    fn assemble(
        self,
        event_rx: mpsc::Receiver<notify::Result<Event>>,
        watcher: Option<notify::RecommendedWatcher>,
    ) -> Result<IconWatcher, WatchError> {
        let index = self.index.ok_or_else(|| WatchError::InitFailed {
            reason: "Index is required".to_string(),
        })?;
        let broadcaster = self.broadcaster.unwrap_or_default();

        Ok(IconWatcher {
            index,
            batcher: ChangeBatcher::new(self.debounce_ms),
            event_rx,
            watcher,
            broadcaster,
            roots: self.roots,
        })
    }
}

impl Default for IconWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
