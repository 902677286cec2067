//! Configuration schema definitions.
//!
//! This module defines the routing structure a fragment file contributes to
//! and the aggregate snapshot published to the control plane.
//! All types derive Serde traits for deserialization from fragment files.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Provider identifier carried by every snapshot message.
pub const PROVIDER_NAME: &str = "file";

/// A named pool of upstream servers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Backend {
    /// Upstream servers keyed by server name.
    pub servers: HashMap<String, Server>,

    /// Optional load balancing settings.
    #[serde(rename = "loadbalancer", skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,

    /// Optional active health check.
    #[serde(rename = "healthcheck", skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,

    /// Optional circuit breaker.
    #[serde(rename = "circuitbreaker", skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreaker>,
}

/// A single upstream server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Server {
    /// Server URL (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Weight for weighted load balancing (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadBalancer {
    /// Balancing method ("wrr" or "drr").
    pub method: String,
    pub sticky: bool,
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self {
            method: "wrr".to_string(),
            sticky: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheck {
    /// Path to probe.
    pub path: String,

    /// Probe interval (e.g., "30s").
    pub interval: String,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            interval: "30s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CircuitBreaker {
    /// Trip expression (e.g., "NetworkErrorRatio() > 0.5").
    pub expression: String,
}

/// A named routing rule selecting a backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Frontend {
    /// Backend name to forward to.
    pub backend: String,

    /// Entry points this frontend listens on.
    #[serde(rename = "entrypoints")]
    pub entry_points: Vec<String>,

    /// Matching rules keyed by route name.
    pub routes: HashMap<String, Route>,

    #[serde(rename = "passhostheader")]
    pub pass_host_header: bool,

    /// Frontend priority (higher = checked first).
    pub priority: i32,

    /// Basic auth users ("user:hash").
    #[serde(rename = "basicauth")]
    pub basic_auth: Vec<String>,
}

impl Default for Frontend {
    fn default() -> Self {
        Self {
            backend: String::new(),
            entry_points: Vec::new(),
            routes: HashMap::new(),
            pass_host_header: true,
            priority: 0,
            basic_auth: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Route {
    /// Rule expression (e.g., "Host:example.com").
    pub rule: String,
}

/// TLS termination settings for one or more entry points.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfiguration {
    #[serde(rename = "entrypoints")]
    pub entry_points: Vec<String>,

    pub certificate: Certificate,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Certificate {
    /// Path to certificate file (PEM), or inline PEM.
    #[serde(rename = "certFile")]
    pub cert_file: String,

    /// Path to private key file (PEM), or inline PEM.
    #[serde(rename = "keyFile")]
    pub key_file: String,
}

/// Surrogate identity of a decoded TLS configuration.
///
/// Two fragments that decode equal-looking TLS blocks still get distinct
/// identities; entries are never compared structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TlsId(u64);

static NEXT_TLS_ID: AtomicU64 = AtomicU64::new(1);

impl TlsId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        TlsId(NEXT_TLS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A TLS configuration tagged with its surrogate identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TlsEntry {
    pub id: TlsId,
    pub config: TlsConfiguration,
}

impl TlsEntry {
    pub fn new(config: TlsConfiguration) -> Self {
        Self {
            id: TlsId::next(),
            config,
        }
    }
}

/// Raw decoder output for one file. Any container may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedFragment {
    pub backends: Option<HashMap<String, Backend>>,
    pub frontends: Option<HashMap<String, Frontend>>,
    pub tls: Option<Vec<TlsConfiguration>>,
}

impl DecodedFragment {
    /// True when the decoder produced none of the three containers.
    pub fn is_absent(&self) -> bool {
        self.backends.is_none() && self.frontends.is_none() && self.tls.is_none()
    }
}

/// Normalized content of one fragment file.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub backends: HashMap<String, Backend>,
    pub frontends: HashMap<String, Frontend>,
    pub tls: Vec<TlsEntry>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty() && self.frontends.is_empty() && self.tls.is_empty()
    }
}

impl From<DecodedFragment> for Fragment {
    fn from(decoded: DecodedFragment) -> Self {
        Self {
            backends: decoded.backends.unwrap_or_default(),
            frontends: decoded.frontends.unwrap_or_default(),
            tls: decoded
                .tls
                .unwrap_or_default()
                .into_iter()
                .map(TlsEntry::new)
                .collect(),
        }
    }
}

/// Aggregate configuration snapshot.
///
/// Backend and frontend names are unique; TLS entries are distinct by
/// [`TlsId`]. Once published a snapshot is owned by the consumer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Configuration {
    pub backends: HashMap<String, Backend>,
    pub frontends: HashMap<String, Frontend>,
    pub tls: Vec<TlsEntry>,
}

impl From<Fragment> for Configuration {
    fn from(fragment: Fragment) -> Self {
        Self {
            backends: fragment.backends,
            frontends: fragment.frontends,
            tls: fragment.tls,
        }
    }
}

/// Snapshot message sent to the control plane.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigMessage {
    pub provider_name: &'static str,
    pub configuration: Configuration,
}

impl ConfigMessage {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            provider_name: PROVIDER_NAME,
            configuration,
        }
    }
}
