//! Filesystem event loop.
//!
//! # Responsibilities
//! - Wait on stop signal, filesystem events and watcher errors
//! - Keep the watch set in sync with directory creation/removal
//! - Trigger a full reload for every relevant event
//!
//! # Design Decisions
//! - One loop per provider, running as a single pool task
//! - Reloads run inline: the loop does not look at the next event until the
//!   snapshot has been handed to the consumer
//! - Watcher errors are logged; only the stop signal ends the loop

use std::future::Future;
use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::watch::source::{FsEvent, FsEventKind, WatchSource, WatchStreams};
use crate::watch::watch_set::WatchSetManager;

/// Invoked by the dispatcher whenever the configuration must be rebuilt.
pub trait ReloadHandler: Send {
    fn reload(&mut self) -> impl Future<Output = ()> + Send;
}

/// What the dispatcher is watching, fixed at startup.
#[derive(Debug)]
pub enum DispatchMode {
    /// A single file; only events whose file name matches trigger a reload.
    SingleTarget { target: PathBuf },
    /// A directory tree; every event triggers a reload.
    DirectoryTree { manager: WatchSetManager },
}

impl DispatchMode {
    fn name(&self) -> &'static str {
        match self {
            DispatchMode::SingleTarget { .. } => "single-target",
            DispatchMode::DirectoryTree { .. } => "directory-tree",
        }
    }

    /// Apply watch-set changes for `event` and decide whether to reload.
    fn on_event<S: WatchSource + ?Sized>(&mut self, source: &mut S, event: &FsEvent) -> bool {
        match self {
            DispatchMode::SingleTarget { target } => {
                event.path.file_name().is_some() && event.path.file_name() == target.file_name()
            }
            DispatchMode::DirectoryTree { manager } => {
                match event.kind {
                    FsEventKind::Remove | FsEventKind::Rename => {
                        manager.on_directory_removed_or_renamed(source, &event.path);
                    }
                    FsEventKind::Create => manager.on_directory_created(source, &event.path),
                    FsEventKind::Write | FsEventKind::Chmod => {}
                }
                true
            }
        }
    }
}

/// Control loop owning the watch source and the watch set.
pub struct EventDispatcher<S> {
    source: S,
    streams: WatchStreams,
    mode: DispatchMode,
}

impl<S: WatchSource> EventDispatcher<S> {
    pub fn new(source: S, streams: WatchStreams, mode: DispatchMode) -> Self {
        Self {
            source,
            streams,
            mode,
        }
    }

    /// Run until `stop` fires (or its sender is dropped).
    ///
    /// A reload already in progress always completes before the stop is
    /// observed. The watch source is released on exit.
    pub async fn run<R: ReloadHandler>(self, mut stop: broadcast::Receiver<()>, mut reload: R) {
        let Self {
            mut source,
            mut streams,
            mut mode,
        } = self;

        tracing::info!(mode = mode.name(), "File watcher started");

        loop {
            tokio::select! {
                _ = stop.recv() => {
                    tracing::debug!("Stop signal received");
                    break;
                }
                Some(event) = streams.events.recv() => {
                    tracing::trace!(path = %event.path.display(), kind = ?event.kind, "Filesystem event");
                    if mode.on_event(&mut source, &event) {
                        reload.reload().await;
                    }
                }
                Some(err) = streams.errors.recv() => {
                    tracing::error!(error = %err, "Watcher event error");
                }
            }
        }

        source.release();
        tracing::info!("File watcher stopped");
    }
}
