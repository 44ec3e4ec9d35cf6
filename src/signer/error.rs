//! Signing error taxonomy and its JSON-RPC rendering.

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::rpc::JsonRpcError;
use crate::signer::state::{InvalidTransition, SubmissionState};

/// Stable JSON-RPC error codes for custody signing.
pub mod codes {
    /// EIP-1193 "user rejected request".
    pub const REJECTED: i64 = 4001;
    /// EIP-1193 "unsupported method".
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;
    pub const SUBMISSION_FAILED: i64 = -32010;
    pub const CUSTODY_FAILED: i64 = -32011;
    pub const TIMEOUT: i64 = -32012;
    pub const ACCOUNTS_UNAVAILABLE: i64 = -32013;
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error("{method} is not supported with custody signing")]
    UnsupportedMethod { method: String },

    /// The custody service did not accept the request. Not retried.
    #[error("custody service did not accept the request: {reason}")]
    Submission { reason: String },

    /// The custody workflow denied or failed the transaction.
    #[error("custody transaction {custody_tx_id} ended {state}: {reason}")]
    Rejected {
        custody_tx_id: String,
        state: SubmissionState,
        reason: String,
    },

    /// The local wait ended before a terminal state. The remote outcome is unknown.
    #[error(
        "custody transaction {custody_tx_id} not final after {waited:?} (last state {last_state}); it may still complete"
    )]
    Timeout {
        custody_tx_id: String,
        last_state: SubmissionState,
        waited: Duration,
        cause: Option<String>,
    },

    #[error("custody transaction {custody_tx_id} completed without a {missing}")]
    MissingResult {
        custody_tx_id: String,
        missing: &'static str,
    },

    #[error("failed to list custody accounts: {reason}")]
    Accounts { reason: String },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl SigningError {
    pub fn invalid_params(method: &str, reason: impl Into<String>) -> Self {
        SigningError::InvalidParams {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            SigningError::InvalidParams { .. } => codes::INVALID_PARAMS,
            SigningError::UnsupportedMethod { .. } => codes::UNSUPPORTED_METHOD,
            SigningError::Submission { .. } => codes::SUBMISSION_FAILED,
            SigningError::Rejected { state: SubmissionState::Rejected, .. } => codes::REJECTED,
            SigningError::Rejected { .. } => codes::CUSTODY_FAILED,
            SigningError::Timeout { .. } => codes::TIMEOUT,
            SigningError::MissingResult { .. } => codes::CUSTODY_FAILED,
            SigningError::Accounts { .. } => codes::ACCOUNTS_UNAVAILABLE,
            SigningError::InvalidTransition(_) => codes::INTERNAL,
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            SigningError::Rejected { custody_tx_id, state, reason } => Some(json!({
                "custodyTxId": custody_tx_id,
                "state": state,
                "reason": reason,
            })),
            SigningError::Timeout { custody_tx_id, last_state, cause, .. } => Some(json!({
                "custodyTxId": custody_tx_id,
                "state": SubmissionState::TimedOut,
                "lastState": last_state,
                "cause": cause,
            })),
            SigningError::MissingResult { custody_tx_id, .. } => Some(json!({
                "custodyTxId": custody_tx_id,
            })),
            _ => None,
        }
    }

    pub fn to_json_rpc(&self) -> JsonRpcError {
        let error = JsonRpcError::new(self.code(), self.to_string());
        match self.data() {
            Some(data) => error.with_data(data),
            None => error,
        }
    }
}
