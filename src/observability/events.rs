//! Submission status events.
//!
//! Emitted once per state transition, in transition order, only when the
//! network has `log_transaction_status_changes` enabled.

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::custody::CustodyStatus;
use crate::signer::SubmissionState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub request_id: Uuid,
    pub method: String,
    pub custody_tx_id: Option<String>,
    pub from: SubmissionState,
    pub to: SubmissionState,
    /// Raw custody status that caused the transition, if any.
    pub custody_status: Option<CustodyStatus>,
    pub elapsed: Duration,
}

/// Receives status events. Must not block.
pub trait StatusListener: Send + Sync {
    fn on_transition(&self, event: &StatusEvent);
}

/// Writes every event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusListener;

impl StatusListener for TracingStatusListener {
    fn on_transition(&self, event: &StatusEvent) {
        tracing::info!(
            target: "custody_signer::status",
            request_id = %event.request_id,
            method = %event.method,
            custody_tx_id = event.custody_tx_id.as_deref().unwrap_or("-"),
            from = %event.from,
            to = %event.to,
            custody_status = ?event.custody_status,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "Custody transaction status changed"
        );
    }
}
