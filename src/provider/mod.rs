//! File configuration provider.
//!
//! # Data Flow
//! ```text
//! provide():
//!     build_configuration() ── error ──▶ returned to caller
//!         │
//!         ├─ watch = true → NotifyWatchSource + watch set → pool.go(dispatcher)
//!         │
//!         └─ initial snapshot → tx
//!
//! dispatcher (background):
//!     event → SnapshotReloader → stat target → rebuild → tx
//! ```
//!
//! # Design Decisions
//! - Startup failures are fatal; watch-time failures only log
//! - Directory mode watches the whole tree; file modes watch the parent
//!   directory and filter by file name

mod reload;

pub use reload::SnapshotReloader;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{
    ConfigLoader, ConfigMerger, ConfigMessage, ConfigSource, Configuration, Decoder, LoadMode,
    ProviderConfig, TemplateEngine,
};
use crate::error::Result;
use crate::lifecycle::Pool;
use crate::watch::{DispatchMode, EventDispatcher, NotifyWatchSource, WatchSetManager, WatchSource};

/// Loads configuration from a file or a directory of fragments and,
/// optionally, keeps publishing it as the files change.
#[derive(Debug, Clone)]
pub struct Provider {
    config: ProviderConfig,
    loader: ConfigLoader,
}

impl Provider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            loader: ConfigLoader::default(),
        }
    }

    /// Replace the loader (decoder and template engine).
    pub fn with_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.loader = self.loader.with_decoder(decoder);
        self
    }

    pub fn with_template_engine(mut self, templates: Arc<TemplateEngine>) -> Self {
        self.loader = self.loader.with_template_engine(templates);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build a complete snapshot from the configured source.
    ///
    /// The single file is template-expanded; the fallback file is not.
    pub fn build_configuration(&self) -> Result<Configuration> {
        match self.config.source()? {
            ConfigSource::Directory(dir) => {
                ConfigMerger::new(self.loader.clone()).merge_directory(dir, None)
            }
            ConfigSource::File(file) => self
                .loader
                .load(file, LoadMode::Templated)
                .map(Configuration::from),
            ConfigSource::Fallback(file) => {
                self.loader.load(file, LoadMode::Raw).map(Configuration::from)
            }
        }
    }

    /// Publish the initial snapshot and, if enabled, start watching.
    ///
    /// Errors from the initial build or from creating the watcher are
    /// returned; nothing is published in that case.
    pub async fn provide(&self, tx: mpsc::Sender<ConfigMessage>, pool: &mut Pool) -> Result<()> {
        let configuration = self.build_configuration()?;

        tracing::info!(
            backends = configuration.backends.len(),
            frontends = configuration.frontends.len(),
            tls = configuration.tls.len(),
            "Configuration loaded"
        );

        if self.config.watch {
            self.start_watching(tx.clone(), pool)?;
        }

        if tx.send(ConfigMessage::new(configuration)).await.is_err() {
            tracing::warn!("Configuration receiver dropped, initial snapshot discarded");
        }
        Ok(())
    }

    fn start_watching(&self, tx: mpsc::Sender<ConfigMessage>, pool: &mut Pool) -> Result<()> {
        let source_config = self.config.source()?;
        let target = source_config.path().to_path_buf();
        let (mut source, streams) = NotifyWatchSource::new()?;

        let mode = match source_config {
            ConfigSource::Directory(dir) => {
                let mut manager = WatchSetManager::new();
                manager.register(&mut source, dir)?;
                DispatchMode::DirectoryTree { manager }
            }
            ConfigSource::File(file) | ConfigSource::Fallback(file) => {
                let parent = parent_dir(file);
                if let Err(e) = source.add(&parent) {
                    tracing::error!(
                        path = %parent.display(),
                        error = %e,
                        "Unable to add file watcher on directory"
                    );
                }
                DispatchMode::SingleTarget {
                    target: file.to_path_buf(),
                }
            }
        };

        tracing::info!(target = %target.display(), "Watching configuration for changes");

        let dispatcher = EventDispatcher::new(source, streams, mode);
        let reloader = SnapshotReloader::new(self.clone(), target, tx);
        pool.go(move |stop| dispatcher.run(stop, reloader));
        Ok(())
    }
}

/// Directory to watch for a single file; `.` when the path has no parent.
fn parent_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
