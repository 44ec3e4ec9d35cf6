//! Configuration schema definitions.
//!
//! These are the user-facing, loosely typed shapes read from the config
//! file. Nothing downstream consumes them directly: `guard::prepare` turns
//! them into validated [`CustodyConfig`](crate::config::CustodyConfig)s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resilience::BackoffStrategy;

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UserConfig {
    /// Network definitions keyed by network name.
    pub networks: BTreeMap<String, NetworkUserConfig>,

    /// JSON-RPC endpoint settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A single HTTP network.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkUserConfig {
    /// JSON-RPC endpoint of the node.
    pub url: Option<String>,

    /// Per-request timeout for the base transport in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Extra headers sent with every node request.
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,

    /// Custody signing settings; absent means the network signs nothing.
    #[serde(default)]
    pub custody: Option<CustodyUserConfig>,
}

/// Custody settings as written by the user. Every field is optional.
///
/// `rpc_url` and `user_agent` are accepted so that existing files parse,
/// but they are always overwritten during setup.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CustodyUserConfig {
    /// API credential for the custody service.
    pub api_key: Option<String>,

    /// Base URL of the custody service API.
    pub api_base_url: Option<String>,

    /// Note attached to every custody request.
    pub note: Option<String>,

    /// Emit a structured event on every submission state change.
    pub log_transaction_status_changes: Option<bool>,

    /// Forward proxy for all outbound traffic of this network.
    pub proxy_path: Option<String>,

    pub poll_interval_ms: Option<u64>,
    pub max_poll_interval_ms: Option<u64>,
    pub backoff: Option<BackoffStrategy>,

    /// Consecutive failed status polls tolerated before giving up.
    pub max_poll_failures: Option<u32>,

    /// Local wall-clock budget for a submission to reach a terminal state.
    pub timeout_ms: Option<u64>,

    /// Chain id; resolved from the node when omitted.
    pub chain_id: Option<u64>,

    pub rpc_url: Option<String>,
    pub user_agent: Option<String>,
}

/// JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8545").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8545".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
