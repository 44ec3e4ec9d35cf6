//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Expose the provider adapter as a JSON-RPC endpoint (`POST /`)
//! - Wire up middleware (request ID, tracing, body limit)
//! - Serve until the shutdown signal fires
//!
//! No request timeout layer: a signing call legitimately waits for as long
//! as the custody timeout allows.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::rpc::{JsonRpcError, JsonRpcResponse, ProviderAdapter};

/// JSON-RPC endpoint in front of the provider pipeline.
pub struct RpcServer {
    router: Router,
}

impl RpcServer {
    pub fn new(adapter: ProviderAdapter, config: &ServerConfig) -> Self {
        let router = Router::new()
            .route("/", post(rpc_handler))
            .with_state(adapter)
            .layer(DefaultBodyLimit::max(config.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        Self { router }
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "JSON-RPC server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("JSON-RPC server stopped");
        Ok(())
    }
}

async fn rpc_handler(State(adapter): State<ProviderAdapter>, body: Bytes) -> Json<Value> {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            let response = JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("Parse error: {}", e)),
            );
            return Json(serde_json::to_value(response).unwrap_or(Value::Null));
        }
    };
    Json(adapter.handle_payload(payload).await)
}
