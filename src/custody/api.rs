//! Abstract custody service API.

use alloy::primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

use crate::custody::types::{SigningIntent, StatusReport, SubmissionAck};

/// Errors talking to the custody service.
#[derive(Debug, Error)]
pub enum CustodyApiError {
    #[error("custody request failed: {0}")]
    Network(String),

    #[error("custody service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("custody service rejected the credential (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("invalid custody response: {0}")]
    Decode(String),
}

impl CustodyApiError {
    /// Whether repeating the same idempotent call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CustodyApiError::Network(_) => true,
            CustodyApiError::Status { status, .. } => *status == 429 || *status >= 500,
            CustodyApiError::Unauthorized { .. } | CustodyApiError::Decode(_) => false,
        }
    }
}

/// Operations the signer needs from a custody service.
///
/// `submit` has side effects and must be called at most once per caller
/// request. `status` and `accounts` are idempotent.
#[async_trait]
pub trait CustodyApi: Send + Sync {
    async fn submit(&self, intent: &SigningIntent) -> Result<SubmissionAck, CustodyApiError>;

    async fn status(&self, id: &str) -> Result<StatusReport, CustodyApiError>;

    async fn accounts(&self) -> Result<Vec<Address>, CustodyApiError>;
}
