//! Custody signing provider.
//!
//! Decorates an Ethereum JSON-RPC provider so that signing calls are routed
//! to a remote custody service while everything else goes to the node.

pub mod config;
pub mod custody;
pub mod environment;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod rpc;
pub mod signer;

pub use config::UserConfig;
pub use environment::{setup, SetupError};
pub use http::RpcServer;
pub use lifecycle::Shutdown;
pub use rpc::ProviderAdapter;
pub use signer::CustodySigner;
