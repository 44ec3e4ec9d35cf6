//! HTTP client for the custody service.
//!
//! # Wire Protocol
//! ```text
//! POST {base}/v1/transactions        SigningIntent + rpcUrl  → SubmissionAck
//! GET  {base}/v1/transactions/{id}                           → StatusReport
//! GET  {base}/v1/accounts                                    → AccountList
//! ```
//! Every call carries `X-API-Key` and the library `User-Agent`.

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::{Credential, CustodyConfig};
use crate::custody::api::{CustodyApi, CustodyApiError};
use crate::custody::types::{AccountList, SigningIntent, StatusReport, SubmissionAck};
use crate::rpc::OutboundDispatcher;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Response bodies longer than this are truncated in error messages.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    #[serde(flatten)]
    intent: &'a SigningIntent,
    rpc_url: &'a str,
}

pub struct HttpCustodyClient {
    base: Url,
    credential: Credential,
    user_agent: String,
    rpc_url: Url,
    client: reqwest::Client,
}

impl HttpCustodyClient {
    pub fn new(config: &CustodyConfig, dispatcher: &OutboundDispatcher) -> Self {
        Self {
            base: config.api_base_url.clone(),
            credential: config.credential.clone(),
            user_agent: config.user_agent.clone(),
            rpc_url: config.rpc_url.clone(),
            client: dispatcher.client().clone(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CustodyApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CustodyApiError::Network(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(API_KEY_HEADER, self.credential.expose())
            .header(USER_AGENT, &self.user_agent)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CustodyApiError> {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CustodyApiError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(CustodyApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CustodyApiError::Decode(e.to_string()))
    }
}

fn network_error(e: reqwest::Error) -> CustodyApiError {
    CustodyApiError::Network(e.to_string())
}

#[async_trait]
impl CustodyApi for HttpCustodyClient {
    async fn submit(&self, intent: &SigningIntent) -> Result<SubmissionAck, CustodyApiError> {
        let url = self.endpoint(&["v1", "transactions"])?;
        let body = SubmitBody {
            intent,
            rpc_url: self.rpc_url.as_str(),
        };
        let response = self
            .authorized(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        Self::decode(response).await
    }

    async fn status(&self, id: &str) -> Result<StatusReport, CustodyApiError> {
        let url = self.endpoint(&["v1", "transactions", id])?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(network_error)?;
        Self::decode(response).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, CustodyApiError> {
        let url = self.endpoint(&["v1", "accounts"])?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(network_error)?;
        let list: AccountList = Self::decode(response).await?;
        Ok(list.addresses)
    }
}

impl std::fmt::Debug for HttpCustodyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCustodyClient")
            .field("base", &self.base.as_str())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
