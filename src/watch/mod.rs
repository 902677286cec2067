//! Filesystem watch subsystem.
//!
//! # Data Flow
//! ```text
//! notify (OS thread)
//!     → source.rs (normalize to FsEvent, forward on channels)
//!     → dispatcher.rs (select on stop / events / errors)
//!         → watch_set.rs (add/remove subtree watches on dir create/remove)
//!         → ReloadHandler (full rebuild + publish)
//!
//! enumerator.rs lists directories for the initial watch set and for
//! subtrees that appear later.
//! ```

pub mod dispatcher;
pub mod enumerator;
pub mod source;
pub mod watch_set;

pub use dispatcher::{DispatchMode, EventDispatcher, ReloadHandler};
pub use enumerator::enumerate_directories;
pub use source::{FsEvent, FsEventKind, NotifyWatchSource, WatchSource, WatchStreams};
pub use watch_set::WatchSetManager;
