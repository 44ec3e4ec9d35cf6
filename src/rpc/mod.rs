//! JSON-RPC plumbing.
//!
//! # Data Flow
//! ```text
//! caller
//!     → adapter.rs (EIP-1193 / JSON-RPC envelopes)
//!     → pipeline.rs (ordered stages, e.g. the custody signer)
//!     → transport.rs (JSON-RPC over HTTP)
//!     → remote node
//! ```
//!
//! # Design Decisions
//! - Stages are composed once, at construction; no runtime re-wrapping
//! - Node errors are carried as `ProviderError::Rpc` and never rewritten
//! - Outbound HTTP goes through an explicitly passed `OutboundDispatcher`

pub mod adapter;
pub mod dispatcher;
pub mod pipeline;
pub mod transport;
pub mod types;

pub use adapter::ProviderAdapter;
pub use dispatcher::OutboundDispatcher;
pub use pipeline::{Next, Pipeline, PipelineBuilder, Stage};
pub use transport::{HttpTransport, Transport};
pub use types::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ProviderError, ProviderRequest,
    ProviderResult, TransportError,
};
