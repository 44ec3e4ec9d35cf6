//! Custody signing stage.
//!
//! # Responsibilities
//! - Forward non-signing calls unchanged
//! - Answer account listing from the custody service
//! - Run signing calls through submit → poll → resolve
//!
//! # Design Decisions
//! - Exactly one `submit` per intercepted call, never retried
//! - No result is produced before custody reports a terminal state
//! - Per-call state lives in a `PendingSubmission` owned by the call

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::Instrument;

use crate::config::CustodyConfig;
use crate::custody::{CustodyApi, SigningIntent};
use crate::observability::{metrics, StatusListener, TracingStatusListener};
use crate::rpc::{Next, ProviderError, ProviderRequest, ProviderResult, Stage, TransportError};
use crate::signer::classifier::{classify, Classification, SigningMethod};
use crate::signer::error::SigningError;
use crate::signer::normalize::build_intent;
use crate::signer::poller;
use crate::signer::state::{PendingSubmission, SubmissionState};
use crate::signer::translate::resolve;

pub struct CustodySigner {
    config: Arc<CustodyConfig>,
    custody: Arc<dyn CustodyApi>,
    listener: Arc<dyn StatusListener>,
    chain_id: OnceCell<u64>,
}

impl CustodySigner {
    pub fn new(config: Arc<CustodyConfig>, custody: Arc<dyn CustodyApi>) -> Self {
        Self {
            config,
            custody,
            listener: Arc::new(TracingStatusListener),
            chain_id: OnceCell::new(),
        }
    }

    /// Replace the status event sink. Events are still only emitted when
    /// `log_transaction_status_changes` is on.
    pub fn with_listener(mut self, listener: Arc<dyn StatusListener>) -> Self {
        self.listener = listener;
        self
    }

    fn event_listener(&self) -> Option<Arc<dyn StatusListener>> {
        self.config
            .log_transaction_status_changes
            .then(|| self.listener.clone())
    }

    async fn chain_id(&self, next: Next<'_>) -> ProviderResult<u64> {
        if let Some(id) = self.config.chain_id {
            return Ok(id);
        }
        let network = self.config.network.clone();
        self.chain_id
            .get_or_try_init(|| async move {
                let value = next
                    .run(ProviderRequest::new("eth_chainId", vec![]))
                    .await?;
                match parse_quantity(&value) {
                    Some(id) => Ok(id),
                    None => Err(ProviderError::from(TransportError::Decode {
                        network,
                        message: format!("eth_chainId returned {}", value),
                    })),
                }
            })
            .await
            .copied()
    }

    async fn accounts(&self) -> ProviderResult<Value> {
        let accounts = self
            .custody
            .accounts()
            .await
            .map_err(|e| SigningError::Accounts {
                reason: e.to_string(),
            })?;
        Ok(json!(accounts))
    }

    async fn sign(
        &self,
        method: SigningMethod,
        request: ProviderRequest,
        next: Next<'_>,
    ) -> ProviderResult<Value> {
        match method {
            SigningMethod::Accounts => return self.accounts().await,
            SigningMethod::SignTransaction => {
                return Err(SigningError::UnsupportedMethod {
                    method: request.method,
                }
                .into())
            }
            _ => {}
        }

        let chain_id = self.chain_id(next).await?;
        let intent = build_intent(method, &request, &self.config.note, chain_id)?;

        let mut pending = PendingSubmission::new(request, method, self.event_listener());
        let span = tracing::info_span!(
            "custody_submission",
            request_id = %pending.request_id(),
            method = %pending.request().method,
            network = %self.config.network,
        );

        self.submit_and_wait(&mut pending, &intent)
            .instrument(span)
            .await
    }

    async fn submit_and_wait(
        &self,
        pending: &mut PendingSubmission,
        intent: &SigningIntent,
    ) -> ProviderResult<Value> {
        metrics::record_submission();
        let ack = match self.custody.submit(intent).await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!(error = %e, "Custody submission failed");
                pending
                    .advance(SubmissionState::Failed, None)
                    .map_err(SigningError::from)?;
                metrics::record_outcome(SubmissionState::Failed, pending.created_at().elapsed());
                return Err(SigningError::Submission {
                    reason: e.to_string(),
                }
                .into());
            }
        };
        tracing::info!(
            custody_tx_id = %ack.id,
            status = ?ack.status,
            note = %intent.note(),
            "Submitted to custody"
        );
        pending.acknowledge(&ack).map_err(SigningError::from)?;

        let outcome = match poller::settled_by_ack(pending, &ack) {
            Some(outcome) => outcome,
            None => poller::wait(&self.config.poll, self.custody.as_ref(), pending, &ack.id).await,
        };
        let result = resolve(pending, outcome);

        metrics::record_outcome(pending.state(), pending.created_at().elapsed());
        match &result {
            Ok(value) => tracing::info!(custody_tx_id = %ack.id, result = %value, "Custody request completed"),
            Err(e) => tracing::warn!(custody_tx_id = %ack.id, error = %e, "Custody request did not complete"),
        }
        Ok(result?)
    }
}

#[async_trait]
impl Stage for CustodySigner {
    fn name(&self) -> &'static str {
        "custody-signer"
    }

    async fn handle(&self, request: ProviderRequest, next: Next<'_>) -> ProviderResult<Value> {
        match classify(&request.method) {
            Classification::Signing(method) => self.sign(method, request, next).await,
            Classification::Ambiguous => {
                tracing::warn!(
                    method = %request.method,
                    "Forwarding unrecognised signing-like method to the node"
                );
                metrics::record_pass_through();
                next.run(request).await
            }
            Classification::PassThrough => {
                metrics::record_pass_through();
                next.run(request).await
            }
        }
    }
}

impl std::fmt::Debug for CustodySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodySigner")
            .field("network", &self.config.network)
            .field("chain_id", &self.chain_id.get())
            .finish()
    }
}

fn parse_quantity(value: &Value) -> Option<u64> {
    let hex = value.as_str()?.strip_prefix("0x")?;
    u64::from_str_radix(hex, 16).ok()
}
