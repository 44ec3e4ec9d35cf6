//! Polling controller.
//!
//! # Responsibilities
//! - Query custody status until a terminal report or the local deadline
//! - Pace polls per `PollPolicy`; back off after failed polls
//! - Give up after too many consecutive failures
//!
//! Every poll is a read. Returning from `wait` (or dropping its future)
//! stops polling; the custody workflow itself is untouched.

use tokio::time::{sleep, timeout};

use crate::custody::{CustodyApi, StatusReport, SubmissionAck};
use crate::observability::metrics;
use crate::resilience::{Deadline, PollPolicy};
use crate::signer::state::{PendingSubmission, SubmissionState};

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Custody reported a terminal status.
    Terminal(StatusReport),
    /// The wall-clock budget ran out.
    DeadlineExceeded { polls: u32, last_error: Option<String> },
    /// Status polls kept failing.
    Unreachable { polls: u32, error: String },
}

/// The outcome already settled by the acknowledgement, if any.
///
/// A refusal needs no polling. A completed acknowledgement is still polled
/// to read the hash or signature.
pub fn settled_by_ack(pending: &PendingSubmission, ack: &SubmissionAck) -> Option<PollOutcome> {
    let state = pending.state();
    if !state.is_terminal() || state == SubmissionState::Confirmed {
        return None;
    }
    Some(PollOutcome::Terminal(StatusReport {
        id: ack.id.clone(),
        status: ack.status,
        tx_hash: None,
        signature: None,
        reason: ack.reason.clone(),
    }))
}

/// Poll `remote_id` until it is final, updating `pending` along the way.
pub async fn wait(
    policy: &PollPolicy,
    custody: &dyn CustodyApi,
    pending: &mut PendingSubmission,
    remote_id: &str,
) -> PollOutcome {
    let deadline = Deadline::starting_at(pending.created_at(), policy.timeout);
    let mut polls = 0u32;
    let mut failures = 0u32;
    let mut last_error: Option<String> = None;
    let mut delay = policy.delay_for(1);

    loop {
        sleep(delay.min(deadline.remaining())).await;
        if deadline.is_expired() {
            tracing::debug!(
                request_id = %pending.request_id(),
                budget_ms = deadline.budget().as_millis() as u64,
                polls,
                "Custody wait budget exhausted"
            );
            return PollOutcome::DeadlineExceeded { polls, last_error };
        }

        polls += 1;
        pending.mark_polled();

        let report = match timeout(deadline.remaining(), custody.status(remote_id)).await {
            Err(_) => return PollOutcome::DeadlineExceeded { polls, last_error },
            Ok(result) => result,
        };

        match report {
            Ok(report) => {
                failures = 0;
                pending.observe(report.status);

                let terminal = SubmissionState::from_custody(report.status)
                    .map(|s| s.is_terminal())
                    .unwrap_or(false);
                if terminal {
                    return PollOutcome::Terminal(report);
                }

                tracing::debug!(
                    request_id = %pending.request_id(),
                    custody_tx_id = %remote_id,
                    state = %pending.state(),
                    polls,
                    "Custody transaction not final yet"
                );
                delay = policy.delay_for(polls + 1);
            }
            Err(e) => {
                failures += 1;
                metrics::record_poll_error();
                tracing::warn!(
                    request_id = %pending.request_id(),
                    custody_tx_id = %remote_id,
                    attempt = failures,
                    error = %e,
                    "Custody status poll failed"
                );

                if !e.is_transient() || failures > policy.max_consecutive_failures {
                    return PollOutcome::Unreachable {
                        polls,
                        error: e.to_string(),
                    };
                }
                last_error = Some(e.to_string());
                delay = policy.retry_delay(failures);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::{CustodyApiError, CustodyStatus, SigningIntent, SubmissionAck};
    use crate::rpc::ProviderRequest;
    use crate::signer::classifier::SigningMethod;
    use alloy::primitives::Address;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Script(Mutex<VecDeque<Result<CustodyStatus, CustodyApiError>>>);

    impl Script {
        fn new(steps: Vec<Result<CustodyStatus, CustodyApiError>>) -> Self {
            Self(Mutex::new(steps.into()))
        }
    }

    #[async_trait]
    impl CustodyApi for Script {
        async fn submit(&self, _: &SigningIntent) -> Result<SubmissionAck, CustodyApiError> {
            unreachable!("poller never submits")
        }

        async fn status(&self, id: &str) -> Result<StatusReport, CustodyApiError> {
            let step = self
                .0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(CustodyStatus::PendingAuthorization));
            step.map(|status| StatusReport {
                id: id.to_string(),
                status,
                tx_hash: None,
                signature: None,
                reason: None,
            })
        }

        async fn accounts(&self) -> Result<Vec<Address>, CustodyApiError> {
            Ok(vec![])
        }
    }

    fn policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(20),
            max_consecutive_failures: 2,
            timeout: Duration::from_millis(500),
            ..PollPolicy::default()
        }
    }

    fn submitted() -> PendingSubmission {
        let mut pending = PendingSubmission::new(
            ProviderRequest::new("eth_sendTransaction", vec![]),
            SigningMethod::SendTransaction,
            None,
        );
        pending
            .acknowledge(&SubmissionAck {
                id: "tx".into(),
                status: CustodyStatus::Submitted,
                reason: None,
            })
            .unwrap();
        pending
    }

    #[tokio::test]
    async fn test_walks_to_terminal() {
        let custody = Script::new(vec![
            Ok(CustodyStatus::PendingAuthorization),
            Ok(CustodyStatus::Broadcasting),
            Ok(CustodyStatus::Completed),
        ]);
        let mut pending = submitted();
        let outcome = wait(&policy(), &custody, &mut pending, "tx").await;
        assert!(matches!(outcome, PollOutcome::Terminal(ref r) if r.status == CustodyStatus::Completed));
        assert_eq!(pending.state(), SubmissionState::Confirmed);
        assert!(pending.last_polled_at().is_some());
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let custody = Script::new(vec![
            Err(CustodyApiError::Network("reset".into())),
            Err(CustodyApiError::Status { status: 503, body: String::new() }),
            Ok(CustodyStatus::Completed),
        ]);
        let mut pending = submitted();
        let outcome = wait(&policy(), &custody, &mut pending, "tx").await;
        assert!(matches!(outcome, PollOutcome::Terminal(_)));
    }

    #[tokio::test]
    async fn test_gives_up_after_bounded_failures() {
        let custody = Script::new(vec![
            Err(CustodyApiError::Network("1".into())),
            Err(CustodyApiError::Network("2".into())),
            Err(CustodyApiError::Network("3".into())),
            Ok(CustodyStatus::Completed),
        ]);
        let mut pending = submitted();
        let outcome = wait(&policy(), &custody, &mut pending, "tx").await;
        assert_eq!(
            outcome,
            PollOutcome::Unreachable {
                polls: 3,
                error: "custody request failed: 3".into()
            }
        );
        assert_eq!(pending.state(), SubmissionState::SubmittedToCustody);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let custody = Script::new(vec![Err(CustodyApiError::Unauthorized { status: 401 })]);
        let mut pending = submitted();
        let outcome = wait(&policy(), &custody, &mut pending, "tx").await;
        assert!(matches!(outcome, PollOutcome::Unreachable { polls: 1, .. }));
    }

    #[tokio::test]
    async fn test_deadline() {
        let custody = Script::new(vec![]);
        let mut pending = submitted();
        let policy = PollPolicy {
            timeout: Duration::from_millis(60),
            ..policy()
        };
        let outcome = wait(&policy, &custody, &mut pending, "tx").await;
        assert!(matches!(outcome, PollOutcome::DeadlineExceeded { .. }));
        assert_eq!(pending.state(), SubmissionState::PendingApproval);
    }

    #[test]
    fn test_refusal_in_ack_needs_no_polling() {
        let mut pending = PendingSubmission::new(
            ProviderRequest::new("eth_sendTransaction", vec![]),
            SigningMethod::SendTransaction,
            None,
        );
        let ack = SubmissionAck {
            id: "tx-r".into(),
            status: CustodyStatus::Rejected,
            reason: Some("blocked by policy".into()),
        };
        pending.acknowledge(&ack).unwrap();

        match settled_by_ack(&pending, &ack) {
            Some(PollOutcome::Terminal(report)) => {
                assert_eq!(report.status, CustodyStatus::Rejected);
                assert_eq!(report.reason.as_deref(), Some("blocked by policy"));
            }
            other => panic!("expected a settled outcome, got {:?}", other),
        }
        assert!(settled_by_ack(&submitted(), &ack).is_none());
    }
}
