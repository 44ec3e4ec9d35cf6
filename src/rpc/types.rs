//! JSON-RPC request, response and error types shared by every pipeline stage.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::signer::SigningError;

/// A single JSON-RPC call travelling through the provider pipeline.
///
/// Stages never mutate a request in place; a stage that needs a different
/// request builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl ProviderRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Positional parameter, if present.
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }
}

/// JSON-RPC error object as defined by JSON-RPC 2.0 / EIP-1474.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Inbound JSON-RPC 2.0 envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    /// Absent and `null` both mean no parameters.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<Value>,
}

fn default_version() -> String {
    "2.0".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, request: &ProviderRequest) -> Self {
        Self {
            jsonrpc: default_version(),
            id: id.into(),
            method: request.method.clone(),
            params: request.params.clone(),
        }
    }

    pub fn into_provider_request(self) -> (Value, ProviderRequest) {
        (self.id, ProviderRequest::new(self.method, self.params))
    }
}

/// Outbound JSON-RPC 2.0 envelope. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            // `"result": null` deserializes to None
            (None, None) => Ok(Value::Null),
        }
    }
}

/// Network or protocol failure of the base transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request to {network} failed: {message}")]
    Http { network: String, message: String },

    #[error("{network} returned HTTP status {status}")]
    Status { network: String, status: u16 },

    #[error("invalid JSON-RPC response from {network}: {message}")]
    Decode { network: String, message: String },

    /// A configured header cannot be sent. Raised at construction only.
    #[error("invalid HTTP header configured for {network}: {message}")]
    InvalidHeader { network: String, message: String },
}

/// Error surfaced by any stage of the pipeline.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Error object returned by the remote node, forwarded untouched.
    #[error(transparent)]
    Rpc(#[from] JsonRpcError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

impl ProviderError {
    /// Render the error as the JSON-RPC error object sent back to the caller.
    pub fn to_json_rpc(&self) -> JsonRpcError {
        match self {
            ProviderError::Rpc(e) => e.clone(),
            ProviderError::Transport(e) => {
                JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string())
            }
            ProviderError::Signing(e) => e.to_json_rpc(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
