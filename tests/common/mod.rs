//! Shared utilities for integration testing.

use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use file_provider::ConfigMessage;

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_fragment(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Write `content` outside the watched tree, then rename it to `root/rel`,
/// so the watcher only ever sees the complete file.
#[allow(dead_code)]
pub fn move_fragment_into(staging: &Path, root: &Path, rel: &str, content: &str) {
    let staged = staging.join("staged");
    fs::write(&staged, content).unwrap();
    fs::rename(staged, root.join(rel)).unwrap();
}

/// Fragment defining a single backend with one server.
pub fn backend_fragment(name: &str, url: &str) -> String {
    format!("[backends.{name}.servers.s]\nurl = \"{url}\"\n")
}

/// Sorted backend names of a snapshot.
pub fn backend_names(message: &ConfigMessage) -> Vec<String> {
    let mut names: Vec<_> = message.configuration.backends.keys().cloned().collect();
    names.sort();
    names
}

/// Receive snapshots until one satisfies `pred`, or panic after `timeout`.
#[allow(dead_code)]
pub async fn wait_for_snapshot<F>(
    rx: &mut mpsc::Receiver<ConfigMessage>,
    timeout: Duration,
    pred: F,
) -> ConfigMessage
where
    F: Fn(&ConfigMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = rx.recv().await.expect("provider channel closed");
            if pred(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("expected snapshot never arrived")
}

/// True if no snapshot arrives within `window`.
#[allow(dead_code)]
pub async fn quiet_for(rx: &mut mpsc::Receiver<ConfigMessage>, window: Duration) -> bool {
    tokio::time::timeout(window, rx.recv()).await.is_err()
}
