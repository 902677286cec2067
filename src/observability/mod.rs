//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config / watch / provider produce:
//!     → tracing macros (structured log events)
//!     → metrics.rs (reload outcomes, watched directories, merge conflicts)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, filtered by RUST_LOG)
//!     → Prometheus exporter (optional, installed by the binary)
//! ```

pub mod logging;
pub mod metrics;
