//! Submission state machine.
//!
//! # State Transitions
//! ```text
//! RECEIVED → SUBMITTED_TO_CUSTODY | FAILED
//! SUBMITTED_TO_CUSTODY → PENDING_APPROVAL | BROADCASTING | <terminal>
//! PENDING_APPROVAL → BROADCASTING | <terminal>
//! BROADCASTING → <terminal>
//! <terminal> = CONFIRMED | REJECTED | FAILED | TIMED_OUT
//! ```
//!
//! Transitions only move forward. A custody report that would move the
//! state backwards is ignored.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::custody::{CustodyStatus, SubmissionAck};
use crate::observability::{StatusEvent, StatusListener};
use crate::rpc::ProviderRequest;
use crate::signer::classifier::SigningMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    Received,
    SubmittedToCustody,
    PendingApproval,
    Broadcasting,
    Confirmed,
    Rejected,
    Failed,
    TimedOut,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Confirmed
                | SubmissionState::Rejected
                | SubmissionState::Failed
                | SubmissionState::TimedOut
        )
    }

    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (Received, SubmittedToCustody) | (Received, Failed) => true,
            (Received, _) => false,
            (SubmittedToCustody, PendingApproval) | (SubmittedToCustody, Broadcasting) => true,
            (PendingApproval, Broadcasting) => true,
            (SubmittedToCustody | PendingApproval | Broadcasting, n) => n.is_terminal(),
            (Confirmed | Rejected | Failed | TimedOut, _) => false,
        }
    }

    /// Map a custody status onto the local state machine.
    pub fn from_custody(status: CustodyStatus) -> Option<SubmissionState> {
        match status {
            CustodyStatus::Submitted | CustodyStatus::Queued => {
                Some(SubmissionState::SubmittedToCustody)
            }
            CustodyStatus::PendingAuthorization | CustodyStatus::PendingSignature => {
                Some(SubmissionState::PendingApproval)
            }
            CustodyStatus::Broadcasting | CustodyStatus::Confirming => {
                Some(SubmissionState::Broadcasting)
            }
            CustodyStatus::Completed => Some(SubmissionState::Confirmed),
            CustodyStatus::Cancelled | CustodyStatus::Rejected | CustodyStatus::Blocked => {
                Some(SubmissionState::Rejected)
            }
            CustodyStatus::Failed => Some(SubmissionState::Failed),
            CustodyStatus::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Received => "RECEIVED",
            SubmissionState::SubmittedToCustody => "SUBMITTED_TO_CUSTODY",
            SubmissionState::PendingApproval => "PENDING_APPROVAL",
            SubmissionState::Broadcasting => "BROADCASTING",
            SubmissionState::Confirmed => "CONFIRMED",
            SubmissionState::Rejected => "REJECTED",
            SubmissionState::Failed => "FAILED",
            SubmissionState::TimedOut => "TIMED_OUT",
        }
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid submission transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: SubmissionState,
    pub to: SubmissionState,
}

/// One in-flight signing request.
///
/// Owned by the call that created it. Dropping it before a terminal state
/// stops the local wait only; the custody service keeps going.
pub struct PendingSubmission {
    request_id: Uuid,
    request: ProviderRequest,
    method: SigningMethod,
    remote_id: Option<String>,
    state: SubmissionState,
    created_at: Instant,
    last_polled_at: Option<Instant>,
    listener: Option<Arc<dyn StatusListener>>,
}

impl PendingSubmission {
    /// `listener` is `None` when status events are disabled.
    pub fn new(
        request: ProviderRequest,
        method: SigningMethod,
        listener: Option<Arc<dyn StatusListener>>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request,
            method,
            remote_id: None,
            state: SubmissionState::Received,
            created_at: Instant::now(),
            last_polled_at: None,
            listener,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn request(&self) -> &ProviderRequest {
        &self.request
    }

    pub fn method(&self) -> SigningMethod {
        self.method
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_polled_at(&self) -> Option<Instant> {
        self.last_polled_at
    }

    pub fn mark_polled(&mut self) {
        self.last_polled_at = Some(Instant::now());
    }

    /// Move to `next`, emitting a status event.
    pub fn advance(
        &mut self,
        next: SubmissionState,
        custody_status: Option<CustodyStatus>,
    ) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        let from = self.state;
        self.state = next;

        if let Some(listener) = &self.listener {
            listener.on_transition(&StatusEvent {
                request_id: self.request_id,
                method: self.request.method.clone(),
                custody_tx_id: self.remote_id.clone(),
                from,
                to: next,
                custody_status,
                elapsed: self.created_at.elapsed(),
            });
        }
        Ok(())
    }

    /// Record the custody acknowledgement: remote id, then SUBMITTED_TO_CUSTODY,
    /// then whatever further state the acknowledgement already reports.
    pub fn acknowledge(&mut self, ack: &SubmissionAck) -> Result<(), InvalidTransition> {
        self.remote_id = Some(ack.id.clone());
        self.advance(SubmissionState::SubmittedToCustody, Some(ack.status))?;
        self.observe(ack.status);
        Ok(())
    }

    /// Apply a custody status. Returns true if the state changed.
    pub fn observe(&mut self, status: CustodyStatus) -> bool {
        let Some(next) = SubmissionState::from_custody(status) else {
            tracing::debug!(
                request_id = %self.request_id,
                custody_status = ?status,
                "Unrecognised custody status, keeping current state"
            );
            return false;
        };
        if next == self.state {
            return false;
        }
        match self.advance(next, Some(status)) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(request_id = %self.request_id, error = %e, "Ignoring out-of-order custody status");
                false
            }
        }
    }
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        if let (Some(remote_id), false) = (&self.remote_id, self.state.is_terminal()) {
            tracing::warn!(
                request_id = %self.request_id,
                custody_tx_id = %remote_id,
                state = %self.state,
                "Stopped waiting for custody transaction; it may still complete remotely"
            );
        }
    }
}

impl std::fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("request_id", &self.request_id)
            .field("method", &self.request.method)
            .field("remote_id", &self.remote_id)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(SubmissionState, SubmissionState)>>);

    impl StatusListener for Collect {
        fn on_transition(&self, event: &StatusEvent) {
            self.0.lock().unwrap().push((event.from, event.to));
        }
    }

    fn pending(listener: Option<Arc<dyn StatusListener>>) -> PendingSubmission {
        PendingSubmission::new(
            ProviderRequest::new("eth_sendTransaction", vec![]),
            SigningMethod::SendTransaction,
            listener,
        )
    }

    fn ack(status: CustodyStatus) -> SubmissionAck {
        SubmissionAck {
            id: "tx-1".into(),
            status,
            reason: None,
        }
    }

    #[test]
    fn test_cannot_confirm_before_submission() {
        let mut p = pending(None);
        let err = p.advance(SubmissionState::Confirmed, None).unwrap_err();
        assert_eq!(err.from, SubmissionState::Received);
        assert_eq!(p.state(), SubmissionState::Received);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [
            SubmissionState::Confirmed,
            SubmissionState::Rejected,
            SubmissionState::Failed,
            SubmissionState::TimedOut,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(SubmissionState::Broadcasting));
            assert!(!terminal.can_transition_to(SubmissionState::Confirmed));
        }
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!SubmissionState::Broadcasting.can_transition_to(SubmissionState::PendingApproval));
        assert!(!SubmissionState::PendingApproval.can_transition_to(SubmissionState::SubmittedToCustody));
        assert!(SubmissionState::SubmittedToCustody.can_transition_to(SubmissionState::Confirmed));
    }

    #[test]
    fn test_acknowledge_and_observe_emit_events_in_order() {
        let collect = Arc::new(Collect::default());
        let mut p = pending(Some(collect.clone()));

        p.acknowledge(&ack(CustodyStatus::Submitted)).unwrap();
        assert_eq!(p.remote_id(), Some("tx-1"));
        assert!(!p.observe(CustodyStatus::Queued));
        assert!(p.observe(CustodyStatus::PendingAuthorization));
        assert!(p.observe(CustodyStatus::Broadcasting));
        assert!(!p.observe(CustodyStatus::PendingSignature));
        assert!(p.observe(CustodyStatus::Completed));

        use SubmissionState::*;
        assert_eq!(
            *collect.0.lock().unwrap(),
            vec![
                (Received, SubmittedToCustody),
                (SubmittedToCustody, PendingApproval),
                (PendingApproval, Broadcasting),
                (Broadcasting, Confirmed),
            ]
        );
    }

    #[test]
    fn test_ack_already_terminal() {
        let mut p = pending(None);
        p.acknowledge(&ack(CustodyStatus::Rejected)).unwrap();
        assert_eq!(p.state(), SubmissionState::Rejected);
    }

    #[test]
    fn test_unknown_status_keeps_state() {
        let mut p = pending(None);
        p.acknowledge(&ack(CustodyStatus::Submitted)).unwrap();
        assert!(!p.observe(CustodyStatus::Unknown));
        assert_eq!(p.state(), SubmissionState::SubmittedToCustody);
    }

    #[test]
    fn test_no_events_without_listener() {
        let mut p = pending(None);
        p.acknowledge(&ack(CustodyStatus::Completed)).unwrap();
        assert_eq!(p.state(), SubmissionState::Confirmed);
    }

    #[test]
    fn test_custody_mapping() {
        assert_eq!(
            SubmissionState::from_custody(CustodyStatus::Blocked),
            Some(SubmissionState::Rejected)
        );
        assert_eq!(
            SubmissionState::from_custody(CustodyStatus::Confirming),
            Some(SubmissionState::Broadcasting)
        );
        assert_eq!(SubmissionState::from_custody(CustodyStatus::Unknown), None);
    }
}
