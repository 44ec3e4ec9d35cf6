//! Result/error translation for finished submissions.

use serde_json::{json, Value};

use crate::signer::error::SigningError;
use crate::signer::poller::PollOutcome;
use crate::signer::state::{PendingSubmission, SubmissionState};

/// Turn a poll outcome into the JSON-RPC result of the original call,
/// driving `pending` into its terminal state.
pub fn resolve(pending: &mut PendingSubmission, outcome: PollOutcome) -> Result<Value, SigningError> {
    let custody_tx_id = pending.remote_id().unwrap_or_default().to_string();

    let report = match outcome {
        PollOutcome::Terminal(report) => report,
        PollOutcome::DeadlineExceeded { last_error, .. } => {
            return Err(time_out(pending, custody_tx_id, last_error));
        }
        PollOutcome::Unreachable { error, .. } => {
            return Err(time_out(pending, custody_tx_id, Some(error)));
        }
    };

    let reported = SubmissionState::from_custody(report.status).unwrap_or(pending.state());
    match reported {
        SubmissionState::Confirmed => {
            let result = if pending.method().yields_transaction_hash() {
                report.tx_hash.map(|hash| json!(hash))
            } else {
                report.signature.map(Value::String)
            };
            result.ok_or(SigningError::MissingResult {
                custody_tx_id,
                missing: missing_result(pending),
            })
        }
        state => Err(SigningError::Rejected {
            custody_tx_id,
            state,
            reason: report
                .reason
                .unwrap_or_else(|| format!("custody status {:?}", report.status)),
        }),
    }
}

fn time_out(pending: &mut PendingSubmission, custody_tx_id: String, cause: Option<String>) -> SigningError {
    let last_state = pending.state();
    // Custody already gave a final answer; only the follow-up read failed.
    match last_state {
        SubmissionState::Confirmed => {
            return SigningError::MissingResult {
                custody_tx_id,
                missing: missing_result(pending),
            };
        }
        state if state.is_terminal() => {
            return SigningError::Rejected {
                custody_tx_id,
                state,
                reason: cause.unwrap_or_else(|| format!("custody reported {}", state)),
            };
        }
        _ => {}
    }
    if let Err(e) = pending.advance(SubmissionState::TimedOut, None) {
        tracing::debug!(error = %e, "Submission already final when the wait ended");
    }
    SigningError::Timeout {
        custody_tx_id,
        last_state,
        waited: pending.created_at().elapsed(),
        cause,
    }
}

fn missing_result(pending: &PendingSubmission) -> &'static str {
    if pending.method().yields_transaction_hash() {
        "transaction hash"
    } else {
        "signature"
    }
}
