//! OS-level watch facility.
//!
//! The dispatcher only needs `add`, `remove`, `release`, and the two event
//! streams; `NotifyWatchSource` provides them on top of `notify`, watching
//! every directory non-recursively so the watch set stays under our control.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{ProviderError, Result};

/// Kind of a filesystem change, after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Write,
    Remove,
    Rename,
    Chmod,
}

/// One filesystem change affecting one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Translate a `notify` event into per-path changes.
    ///
    /// A rename is reported as `Rename` for the old name and `Create` for the
    /// new one. Access notifications are not changes and are dropped.
    pub fn from_notify(event: Event) -> Vec<FsEvent> {
        let kind = match event.kind {
            EventKind::Create(_) => FsEventKind::Create,
            EventKind::Remove(_) => FsEventKind::Remove,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FsEventKind::Create,
            // inotify also emits the From/To halves of this pair separately.
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => return Vec::new(),
            EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Rename,
            EventKind::Modify(ModifyKind::Metadata(_)) => FsEventKind::Chmod,
            EventKind::Modify(_) | EventKind::Any => FsEventKind::Write,
            EventKind::Access(_) | EventKind::Other => return Vec::new(),
        };

        event
            .paths
            .into_iter()
            .map(|path| FsEvent { path, kind })
            .collect()
    }
}

/// Receiving ends of a watch source's event and error streams.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<FsEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// Capability to add and remove per-directory watches.
pub trait WatchSource: Send {
    fn add(&mut self, path: &Path) -> notify::Result<()>;

    fn remove(&mut self, path: &Path) -> notify::Result<()>;

    /// Release the underlying OS handle. Later calls to `add`/`remove` fail.
    fn release(&mut self);
}

/// [`WatchSource`] backed by the platform's recommended `notify` watcher.
///
/// Dropping the source also releases the handle.
pub struct NotifyWatchSource {
    watcher: Option<RecommendedWatcher>,
}

impl NotifyWatchSource {
    /// Create the OS watch facility. Failure here is fatal to watch mode.
    pub fn new() -> Result<(Self, WatchStreams)> {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for fs_event in FsEvent::from_notify(event) {
                        let _ = event_tx.send(fs_event);
                    }
                }
                Err(e) => {
                    let _ = error_tx.send(e);
                }
            },
            Config::default(),
        )
        .map_err(ProviderError::WatchSetup)?;

        Ok((
            Self {
                watcher: Some(watcher),
            },
            WatchStreams { events, errors },
        ))
    }

    fn watcher(&mut self) -> notify::Result<&mut RecommendedWatcher> {
        self.watcher
            .as_mut()
            .ok_or_else(|| notify::Error::generic("watcher already released"))
    }
}

impl WatchSource for NotifyWatchSource {
    fn add(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher()?.watch(path, RecursiveMode::NonRecursive)
    }

    fn remove(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher()?.unwatch(path)
    }

    fn release(&mut self) {
        if self.watcher.take().is_some() {
            tracing::debug!("File watcher released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for p in paths {
            event = event.add_path(PathBuf::from(p));
        }
        event
    }

    #[test]
    fn test_create_and_remove() {
        let created = FsEvent::from_notify(event(EventKind::Create(CreateKind::Folder), &["/r/a"]));
        assert_eq!(created, vec![FsEvent::new("/r/a", FsEventKind::Create)]);

        let removed = FsEvent::from_notify(event(EventKind::Remove(RemoveKind::Any), &["/r/a"]));
        assert_eq!(removed, vec![FsEvent::new("/r/a", FsEventKind::Remove)]);
    }

    #[test]
    fn test_rename_halves() {
        let from = FsEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/r/old"],
        ));
        assert_eq!(from, vec![FsEvent::new("/r/old", FsEventKind::Rename)]);

        let to = FsEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/r/new"],
        ));
        assert_eq!(to, vec![FsEvent::new("/r/new", FsEventKind::Create)]);

        let both = FsEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/r/old", "/r/new"],
        ));
        assert!(both.is_empty());
    }

    #[test]
    fn test_write_chmod_and_access() {
        let write = FsEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/r/a.toml"],
        ));
        assert_eq!(write[0].kind, FsEventKind::Write);

        let chmod = FsEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/r/a.toml"],
        ));
        assert_eq!(chmod[0].kind, FsEventKind::Chmod);

        let access = FsEvent::from_notify(event(EventKind::Access(AccessKind::Any), &["/r/a.toml"]));
        assert!(access.is_empty());
    }

    #[test]
    fn test_released_source_rejects_add() {
        let (mut source, _streams) = NotifyWatchSource::new().unwrap();
        let dir = tempfile::tempdir().unwrap();

        source.add(dir.path()).unwrap();
        source.remove(dir.path()).unwrap();
        source.release();
        assert!(source.add(dir.path()).is_err());
    }
}
