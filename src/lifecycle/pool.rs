//! Worker pool for background provider tasks.

use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Caller-owned pool running long-lived tasks.
///
/// Every task receives its own subscription to a shared stop signal;
/// [`Pool::stop`] fires it and waits for all tasks to return.
pub struct Pool {
    /// Stop signal shared by every task.
    stop_tx: broadcast::Sender<()>,
    tasks: JoinSet<()>,
}

impl Pool {
    pub fn new() -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            stop_tx,
            tasks: JoinSet::new(),
        }
    }

    /// Spawn a task. `f` receives the stop signal it must select on.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn go<F, Fut>(&mut self, f: F)
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stop = self.stop_tx.subscribe();
        self.tasks.spawn(f(stop));
    }

    /// Number of tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Fire the stop signal and wait for every task to exit.
    pub async fn stop(&mut self) {
        let _ = self.stop_tx.send(());
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "Pool task failed");
            }
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}
