//! Metrics collection and exposition.
//!
//! # Metrics
//! - `file_provider_reloads_total` (counter): watch-triggered reloads by outcome
//! - `file_provider_watched_directories` (gauge): directories currently watched
//! - `file_provider_merge_conflicts_total` (counter): entries skipped on name collision

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome of one watch-triggered reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Snapshot rebuilt and published.
    Success,
    /// Rebuild failed; previous snapshot kept.
    Failed,
    /// Watch target could not be stat'ed; nothing rebuilt.
    Skipped,
}

impl ReloadOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ReloadOutcome::Success => "success",
            ReloadOutcome::Failed => "failed",
            ReloadOutcome::Skipped => "skipped",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reload(outcome: ReloadOutcome) {
    metrics::counter!("file_provider_reloads_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_watched_directories(count: usize) {
    metrics::gauge!("file_provider_watched_directories").set(count as f64);
}

pub fn record_merge_conflicts(count: usize) {
    metrics::counter!("file_provider_merge_conflicts_total").increment(count as u64);
}
