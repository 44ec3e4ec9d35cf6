//! Compatibility adapter.
//!
//! Exposes the composed pipeline through the interfaces callers expect:
//! an EIP-1193 style `request(method, params)`, the legacy `send` alias, and
//! raw JSON-RPC 2.0 envelopes (single or batch) for the HTTP endpoint.

use serde_json::Value;
use std::sync::Arc;

use crate::rpc::pipeline::Pipeline;
use crate::rpc::types::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ProviderRequest, ProviderResult,
};

#[derive(Clone, Debug)]
pub struct ProviderAdapter {
    pipeline: Arc<Pipeline>,
}

impl ProviderAdapter {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn request(&self, method: &str, params: Vec<Value>) -> ProviderResult<Value> {
        self.pipeline
            .request(ProviderRequest::new(method, params))
            .await
    }

    /// Legacy alias of [`ProviderAdapter::request`].
    pub async fn send(&self, method: &str, params: Vec<Value>) -> ProviderResult<Value> {
        self.request(method, params).await
    }

    /// Handle one JSON-RPC envelope, keeping the caller's id.
    pub async fn handle_envelope(&self, envelope: JsonRpcRequest) -> JsonRpcResponse {
        let (id, request) = envelope.into_provider_request();
        let method = request.method.clone();
        match self.pipeline.request(request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::debug!(method = %method, error = %e, "Request failed");
                JsonRpcResponse::failure(id, e.to_json_rpc())
            }
        }
    }

    /// Handle a raw payload that may be a single envelope or a batch.
    ///
    /// Batch members are handled sequentially, in order.
    pub async fn handle_payload(&self, payload: Value) -> Value {
        match payload {
            Value::Array(items) if items.is_empty() => {
                to_value(invalid_request(Value::Null, "empty batch"))
            }
            Value::Array(items) => {
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    responses.push(self.handle_single(item).await);
                }
                Value::Array(responses)
            }
            single => self.handle_single(single).await,
        }
    }

    async fn handle_single(&self, item: Value) -> Value {
        let id = item.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(item) {
            Ok(envelope) => to_value(self.handle_envelope(envelope).await),
            Err(e) => to_value(invalid_request(id, &e.to_string())),
        }
    }
}

fn invalid_request(id: Value, reason: &str) -> JsonRpcResponse {
    JsonRpcResponse::failure(
        id,
        JsonRpcError::new(
            JsonRpcError::INVALID_REQUEST,
            format!("Invalid request: {}", reason),
        ),
    )
}

fn to_value(response: JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
