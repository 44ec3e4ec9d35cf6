//! Remote custody service.
//!
//! # Data Flow
//! ```text
//! signer
//!     → api.rs (CustodyApi: submit / status / accounts)
//!     → client.rs (HTTP implementation)
//!     → custody service (system of record for signing)
//! ```
//!
//! # Security Constraints
//! - The credential is only ever written to the `X-API-Key` header
//! - Submissions are not idempotent and are never retried

pub mod api;
pub mod client;
pub mod types;

pub use api::{CustodyApi, CustodyApiError};
pub use client::HttpCustodyClient;
pub use types::{
    CustodyStatus, MessageIntent, MessagePayload, SigningIntent, StatusReport, SubmissionAck,
    TransactionIntent,
};
