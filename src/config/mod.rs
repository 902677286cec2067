//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! fragment file (.toml / .tmpl)
//!     → loader.rs (read, template-expand, decode, normalize)
//!     → Fragment (transient)
//!     → merge.rs (first-write-wins fold over the directory tree)
//!     → Configuration (snapshot, moved to the consumer)
//! ```
//!
//! # Design Decisions
//! - Snapshots are rebuilt from scratch on every reload; no incremental patching
//! - Decoding sits behind the `Decoder` trait; TOML is the default
//! - Containers are never absent once a fragment leaves the loader

pub mod loader;
pub mod merge;
pub mod schema;
pub mod settings;

pub use loader::{ConfigLoader, Decoder, LoadMode, TemplateEngine, TomlDecoder};
pub use merge::ConfigMerger;
pub use schema::{Backend, ConfigMessage, Configuration, Fragment, Frontend, TlsConfiguration, TlsEntry};
pub use settings::{ConfigSource, ProviderConfig};
