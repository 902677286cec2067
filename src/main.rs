//! File configuration provider (v1)
//!
//! Runs the provider standalone and prints a JSON summary of every snapshot
//! it publishes.
//!
//! ```text
//!   fragments/            ┌──────────┐   snapshot   ┌──────────────┐
//!   ├── a.toml    ──────▶ │ provider │ ───────────▶ │ stdout (JSON) │
//!   └── b/b.tmpl          └────┬─────┘              └──────────────┘
//!                              │ notify
//!                              ▼
//!                        watch set / reload
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::sync::mpsc;

use file_provider::config::{ConfigLoader, ConfigMessage, TemplateEngine, TomlDecoder};
use file_provider::lifecycle::signals::shutdown_signal;
use file_provider::observability::{logging, metrics};
use file_provider::{Pool, Provider, ProviderConfig};

#[derive(Parser)]
#[command(name = "file-provider")]
#[command(about = "Publish routing configuration from files, reloading on change", long_about = None)]
struct Cli {
    /// Provider settings file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load every fragment under this directory.
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Load a single templated file.
    #[arg(short, long)]
    filename: Option<PathBuf>,

    /// Last-resort file, loaded without template expansion.
    #[arg(long)]
    fallback_file: Option<PathBuf>,

    /// Watch for changes and republish.
    #[arg(short, long)]
    watch: bool,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

impl Cli {
    fn provider_config(&self) -> file_provider::Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::from_file(path)?,
            None => ProviderConfig::default(),
        };
        if self.directory.is_some() {
            config.directory = self.directory.clone();
        }
        if self.filename.is_some() {
            config.filename = self.filename.clone();
        }
        if self.fallback_file.is_some() {
            config.fallback_file = self.fallback_file.clone();
        }
        config.watch |= self.watch;
        Ok(config)
    }
}

fn summary(message: &ConfigMessage) -> serde_json::Value {
    let mut backends: Vec<_> = message.configuration.backends.keys().collect();
    backends.sort();
    let mut frontends: Vec<_> = message.configuration.frontends.keys().collect();
    frontends.sort();

    json!({
        "provider": message.provider_name,
        "backends": backends,
        "frontends": frontends,
        "tls": message.configuration.tls.len(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(logging::DEFAULT_FILTER);

    let cli = Cli::parse();
    let config = cli.provider_config()?;

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    tracing::info!(
        directory = ?config.directory,
        filename = ?config.filename,
        fallback_file = ?config.fallback_file,
        watch = config.watch,
        "file-provider v0.1.0 starting"
    );

    let loader = ConfigLoader::new(
        Arc::new(TomlDecoder),
        Arc::new(TemplateEngine::new().with_env_function()),
    );
    let provider = Provider::new(config).with_loader(loader);

    let (tx, mut rx) = mpsc::channel(1);
    let mut pool = Pool::new();

    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            println!("{}", summary(&message));
        }
    });

    provider.provide(tx, &mut pool).await?;

    if provider.config().watch {
        shutdown_signal().await;
    }

    pool.stop().await;
    printer.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
