//! Base JSON-RPC transport.
//!
//! # Responsibilities
//! - Wrap a `ProviderRequest` in a JSON-RPC 2.0 envelope and POST it
//! - Relay the node's result or error object unchanged
//! - Report network/protocol failures as `TransportError`
//!
//! Retry policy for plain transport failures belongs to the caller; this
//! layer sends every request exactly once.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

use crate::rpc::dispatcher::OutboundDispatcher;
use crate::rpc::types::{
    JsonRpcRequest, JsonRpcResponse, ProviderError, ProviderRequest, ProviderResult,
    TransportError,
};

/// The innermost capability of the pipeline: send a call to the node.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ProviderRequest) -> ProviderResult<Value>;
}

/// JSON-RPC over HTTP.
pub struct HttpTransport {
    url: Url,
    network: String,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(
        url: Url,
        network: impl Into<String>,
        http_headers: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        dispatcher: &OutboundDispatcher,
    ) -> Result<Self, TransportError> {
        let network = network.into();
        let mut headers = HeaderMap::new();
        for (name, value) in http_headers {
            let invalid = |message: String| TransportError::InvalidHeader {
                network: network.clone(),
                message,
            };
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| invalid(format!("invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        Ok(Self {
            url,
            network,
            headers,
            timeout,
            client: dispatcher.client().clone(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ProviderRequest) -> ProviderResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = JsonRpcRequest::new(id, request);

        let mut builder = self
            .client
            .post(self.url.clone())
            .headers(self.headers.clone())
            .json(&envelope);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| TransportError::Http {
            network: self.network.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| TransportError::Http {
            network: self.network.clone(),
            message: e.to_string(),
        })?;

        // Nodes often attach a JSON-RPC error body to a non-2xx status; prefer it.
        match serde_json::from_slice::<JsonRpcResponse>(&body) {
            Ok(decoded) => decoded.into_result().map_err(ProviderError::Rpc),
            Err(_) if !status.is_success() => Err(TransportError::Status {
                network: self.network.clone(),
                status: status.as_u16(),
            }
            .into()),
            Err(e) => Err(TransportError::Decode {
                network: self.network.clone(),
                message: e.to_string(),
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("network", &self.network)
            .field("url", &self.url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_header() {
        let dispatcher = OutboundDispatcher::direct().unwrap();
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());

        let result = HttpTransport::new(
            "https://rpc.example.org".parse().unwrap(),
            "mainnet",
            &headers,
            None,
            &dispatcher,
        );
        let err = result.unwrap_err();
        assert!(matches!(err, TransportError::InvalidHeader { .. }));
        assert!(err.to_string().contains("invalid header name"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let dispatcher = OutboundDispatcher::direct().unwrap();
        let transport = HttpTransport::new(
            "http://invalid.invalid:8545".parse().unwrap(),
            "broken",
            &BTreeMap::new(),
            Some(Duration::from_secs(2)),
            &dispatcher,
        )
        .unwrap();

        let result = transport
            .send(&ProviderRequest::new("eth_blockNumber", vec![]))
            .await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }
}
