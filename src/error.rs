//! Error types for the file provider.
//!
//! # Policy
//! - Any error during the initial build is returned to the caller of `provide`
//! - During watch mode, every error is logged and the last snapshot stays in effect
//! - `WatchSetup` is the only watch error that is fatal (it prevents entering watch mode)

use std::path::PathBuf;
use thiserror::Error;

/// Error produced by a fragment decoder.
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// None of directory, filename or fallback file is configured.
    #[error("error using file configuration provider: no directory, filename or fallback file defined")]
    ConfigNotFound,

    #[error("unable to stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to expand template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("unable to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("error creating file watcher: {0}")]
    WatchSetup(#[source] notify::Error),

    #[error("unable to add file watcher on directory {}: {source}", .path.display())]
    WatchAdd {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("invalid provider settings in {}: {source}", .path.display())]
    InvalidSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
