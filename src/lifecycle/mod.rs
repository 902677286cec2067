//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Pool (pool.rs):
//!     provider.provide(tx, &mut pool) → pool.go(dispatcher loop)
//!     pool.stop() → stop signal → tasks finish current work → joined
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary calls pool.stop()
//! ```

pub mod pool;
pub mod signals;

pub use pool::Pool;
