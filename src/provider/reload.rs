//! Watch-triggered rebuild and publish.

use std::fs;
use std::future::Future;
use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::ConfigMessage;
use crate::observability::metrics::{self, ReloadOutcome};
use crate::provider::Provider;
use crate::watch::ReloadHandler;

/// Rebuilds the full configuration and sends it to the consumer.
pub struct SnapshotReloader {
    provider: Provider,
    target: PathBuf,
    tx: mpsc::Sender<ConfigMessage>,
}

impl SnapshotReloader {
    pub fn new(provider: Provider, target: PathBuf, tx: mpsc::Sender<ConfigMessage>) -> Self {
        Self {
            provider,
            target,
            tx,
        }
    }

    /// Rebuild from scratch. Returns `None` when the reload was skipped or failed.
    fn rebuild(&self) -> Option<ConfigMessage> {
        // The target can briefly disappear while an editor swaps files.
        if let Err(e) = fs::metadata(&self.target) {
            tracing::debug!(
                path = %self.target.display(),
                error = %e,
                "Unable to get modifications from watch target"
            );
            metrics::record_reload(ReloadOutcome::Skipped);
            return None;
        }

        match self.provider.build_configuration() {
            Ok(configuration) => Some(ConfigMessage::new(configuration)),
            Err(e) => {
                tracing::error!(error = %e, "Error occurred during watcher callback, keeping current configuration");
                metrics::record_reload(ReloadOutcome::Failed);
                None
            }
        }
    }
}

impl ReloadHandler for SnapshotReloader {
    fn reload(&mut self) -> impl Future<Output = ()> + Send {
        let message = self.rebuild();
        let tx = self.tx.clone();

        async move {
            let Some(message) = message else {
                return;
            };
            let backends = message.configuration.backends.len();
            let frontends = message.configuration.frontends.len();

            // Blocks while the consumer is behind.
            if tx.send(message).await.is_err() {
                tracing::warn!("Configuration receiver dropped, snapshot discarded");
                return;
            }
            metrics::record_reload(ReloadOutcome::Success);
            tracing::info!(backends, frontends, "Configuration reloaded");
        }
    }
}
