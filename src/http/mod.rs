//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, request ID, tracing)
//!     → rpc::ProviderAdapter (JSON-RPC envelopes)
//!     → JSON response
//! ```

pub mod server;

pub use server::RpcServer;
