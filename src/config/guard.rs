//! Configuration guard.
//!
//! # Responsibilities
//! - Refuse custody signing on local development networks
//! - Merge per-network custody settings over safe defaults
//! - Force the target RPC URL and the library user-agent
//! - Produce immutable, strongly typed `CustodyConfig`s
//!
//! # Design Decisions
//! - Runs over every network in the file, not just the selected one; a
//!   single unsafe entry aborts setup before anything is constructed
//! - Returns the first violation found

use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::error::ConfigError;
use crate::config::schema::{CustodyUserConfig, NetworkUserConfig, UserConfig};
use crate::resilience::PollPolicy;

/// Note attached to custody requests unless the user provides one.
pub const DEFAULT_NOTE: &str = "Created by custody-signer";

/// Network name reserved for the in-process development chain.
pub const DEV_NETWORK_NAME: &str = "hardhat";

/// Identifies this library and version to the custody service.
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// True when custody signing must not be enabled for the network.
pub fn is_local_network(name: &str, url: &str) -> bool {
    name == DEV_NETWORK_NAME || url.contains("localhost") || url.contains("127.0.0.1")
}

/// Custody API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Validated custody settings for one network. Read-only once built.
#[derive(Debug, Clone)]
pub struct CustodyConfig {
    pub network: String,
    pub note: String,
    pub log_transaction_status_changes: bool,
    /// Always the network's own URL.
    pub rpc_url: Url,
    /// Always [`user_agent()`].
    pub user_agent: String,
    pub api_base_url: Url,
    pub credential: Credential,
    pub proxy: Option<Url>,
    pub poll: PollPolicy,
    pub chain_id: Option<u64>,
}

/// A custody-enabled network ready for provider construction.
#[derive(Debug, Clone)]
pub struct PreparedNetwork {
    pub name: String,
    pub url: Url,
    pub timeout: Option<Duration>,
    pub http_headers: BTreeMap<String, String>,
    pub custody: Arc<CustodyConfig>,
}

/// Output of the guard: every custody-enabled network, validated.
#[derive(Debug, Clone, Default)]
pub struct PreparedConfig {
    networks: BTreeMap<String, PreparedNetwork>,
}

impl PreparedConfig {
    pub fn get(&self, network: &str) -> Option<&PreparedNetwork> {
        self.networks.get(network)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}

/// Validate and merge the custody settings of every network.
pub fn prepare(user: &UserConfig) -> Result<PreparedConfig, ConfigError> {
    let mut networks = BTreeMap::new();

    for (name, network) in &user.networks {
        let Some(custody) = &network.custody else {
            continue;
        };
        let prepared = prepare_network(name, network, custody)?;
        tracing::debug!(
            network = %name,
            rpc_url = %prepared.url,
            api_base_url = %prepared.custody.api_base_url,
            "Custody signing enabled"
        );
        networks.insert(name.clone(), prepared);
    }

    Ok(PreparedConfig { networks })
}

fn prepare_network(
    name: &str,
    network: &NetworkUserConfig,
    custody: &CustodyUserConfig,
) -> Result<PreparedNetwork, ConfigError> {
    let raw_url = network.url.as_deref().unwrap_or("");
    if is_local_network(name, raw_url) {
        return Err(ConfigError::LocalNetwork {
            network: name.to_string(),
        });
    }
    if raw_url.is_empty() {
        return Err(missing(name, "url"));
    }
    let url = parse_url(name, "url", raw_url)?;
    check_headers(name, &network.http_headers)?;

    let config = merge(name, &url, custody)?;

    Ok(PreparedNetwork {
        name: name.to_string(),
        url,
        timeout: network.timeout_ms.map(Duration::from_millis),
        http_headers: network.http_headers.clone(),
        custody: Arc::new(config),
    })
}

/// Merge user settings over defaults. `rpc_url` and `user_agent` from the
/// user are ignored.
fn merge(name: &str, url: &Url, custody: &CustodyUserConfig) -> Result<CustodyConfig, ConfigError> {
    let credential = custody
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| missing(name, "custody.api_key"))?;

    let api_base_url = match custody.api_base_url.as_deref() {
        Some(raw) => parse_url(name, "custody.api_base_url", raw)?,
        None => return Err(missing(name, "custody.api_base_url")),
    };

    let proxy = custody
        .proxy_path
        .as_deref()
        .map(|raw| parse_url(name, "custody.proxy_path", raw))
        .transpose()?;

    let defaults = PollPolicy::default();
    let interval = custody
        .poll_interval_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.interval);
    if interval.is_zero() {
        return Err(invalid(name, "custody.poll_interval_ms", "must be greater than zero"));
    }
    let max_interval = custody
        .max_poll_interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| defaults.max_interval.max(interval));
    if max_interval < interval {
        return Err(invalid(
            name,
            "custody.max_poll_interval_ms",
            "must not be smaller than poll_interval_ms",
        ));
    }
    let timeout = custody
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.timeout);
    if timeout.is_zero() {
        return Err(invalid(name, "custody.timeout_ms", "must be greater than zero"));
    }

    if custody.rpc_url.is_some() || custody.user_agent.is_some() {
        tracing::warn!(
            network = %name,
            "custody.rpc_url and custody.user_agent are set by the library; ignoring configured values"
        );
    }

    Ok(CustodyConfig {
        network: name.to_string(),
        note: custody.note.clone().unwrap_or_else(|| DEFAULT_NOTE.to_string()),
        log_transaction_status_changes: custody.log_transaction_status_changes.unwrap_or(true),
        rpc_url: url.clone(),
        user_agent: user_agent(),
        api_base_url,
        credential: Credential::new(credential),
        proxy,
        poll: PollPolicy {
            interval,
            max_interval,
            strategy: custody.backoff.unwrap_or(defaults.strategy),
            max_consecutive_failures: custody
                .max_poll_failures
                .unwrap_or(defaults.max_consecutive_failures),
            timeout,
        },
        chain_id: custody.chain_id,
    })
}

fn parse_url(network: &str, field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| invalid(network, field, &e.to_string()))
}

fn check_headers(network: &str, headers: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(network, "http_headers", &format!("header name '{}': {}", name, e)))?;
        HeaderValue::from_str(value)
            .map_err(|e| invalid(network, "http_headers", &format!("value of '{}': {}", name, e)))?;
    }
    Ok(())
}

fn missing(network: &str, field: &'static str) -> ConfigError {
    ConfigError::MissingField {
        network: network.to_string(),
        field,
    }
}

fn invalid(network: &str, field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        network: network.to_string(),
        field,
        reason: reason.to_string(),
    }
}
