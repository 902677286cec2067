//! File configuration provider.
//!
//! Loads routing and TLS configuration from a single file or from a tree of
//! fragment files, watches the filesystem, and publishes a complete
//! snapshot on a channel every time the files change.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod watch;

pub use config::{ConfigMessage, Configuration, ProviderConfig};
pub use error::{ProviderError, Result};
pub use lifecycle::Pool;
pub use provider::Provider;
