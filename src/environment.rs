//! Setup-time wiring.
//!
//! # Data Flow
//! ```text
//! UserConfig
//!     → config::prepare (guard over every network; fatal on violation)
//!     → OutboundDispatcher (proxy, built once)
//!     → HttpTransport + HttpCustodyClient (share the dispatcher)
//!     → Pipeline [outer stages..., CustodySigner] → ProviderAdapter
//! ```

use std::sync::Arc;
use thiserror::Error;

use crate::config::{prepare, ConfigError, CustodyConfig, PreparedNetwork, UserConfig};
use crate::custody::{CustodyApi, HttpCustodyClient};
use crate::observability::StatusListener;
use crate::rpc::{HttpTransport, OutboundDispatcher, Pipeline, ProviderAdapter, Stage, Transport, TransportError};
use crate::signer::CustodySigner;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build outbound HTTP client: {0}")]
    Dispatcher(#[from] reqwest::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Validate the whole configuration and build the provider for `network`.
///
/// Nothing is constructed unless every custody-enabled network passes the guard.
pub fn setup(user: &UserConfig, network: &str) -> Result<ProviderAdapter, SetupError> {
    let prepared = prepare(user)?;

    if !user.networks.contains_key(network) {
        return Err(ConfigError::UnknownNetwork {
            network: network.to_string(),
        }
        .into());
    }
    let Some(selected) = prepared.get(network) else {
        return Err(ConfigError::CustodyNotEnabled {
            network: network.to_string(),
        }
        .into());
    };

    build_provider(selected, Vec::new())
}

/// Build the HTTP-backed provider for a prepared network.
///
/// `outer_stages` sit between the caller and the signer, outermost first.
pub fn build_provider(
    network: &PreparedNetwork,
    outer_stages: Vec<Arc<dyn Stage>>,
) -> Result<ProviderAdapter, SetupError> {
    let dispatcher = OutboundDispatcher::new(network.custody.proxy.as_ref())?;

    let transport = HttpTransport::new(
        network.url.clone(),
        network.name.clone(),
        &network.http_headers,
        network.timeout,
        &dispatcher,
    )?;
    let custody = HttpCustodyClient::new(&network.custody, &dispatcher);

    tracing::info!(
        network = %network.name,
        rpc_url = %transport.url(),
        proxied = dispatcher.proxy().is_some(),
        "Custody signing provider ready"
    );

    Ok(assemble(
        network.custody.clone(),
        Arc::new(transport),
        Arc::new(custody),
        outer_stages,
        None,
    ))
}

/// Compose a provider from already-built parts.
pub fn assemble(
    config: Arc<CustodyConfig>,
    transport: Arc<dyn Transport>,
    custody: Arc<dyn CustodyApi>,
    outer_stages: Vec<Arc<dyn Stage>>,
    listener: Option<Arc<dyn StatusListener>>,
) -> ProviderAdapter {
    let mut signer = CustodySigner::new(config, custody);
    if let Some(listener) = listener {
        signer = signer.with_listener(listener);
    }

    let mut builder = Pipeline::builder(transport);
    for stage in outer_stages {
        builder = builder.stage(stage);
    }
    ProviderAdapter::new(builder.stage(Arc::new(signer)).build())
}
