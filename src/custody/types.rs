//! Custody service wire types.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status vocabulary reported by the custody service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyStatus {
    Submitted,
    Queued,
    PendingAuthorization,
    PendingSignature,
    Broadcasting,
    Confirming,
    Completed,
    Cancelled,
    Rejected,
    Blocked,
    Failed,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Unsigned transaction handed to the custody service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    pub note: String,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// `None` for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
}

/// What kind of message is being signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePayload {
    /// `personal_sign`: EIP-191 prefixed message.
    Personal(String),
    /// `eth_sign`: raw data, signed with the same prefix.
    EthSign(String),
    /// `eth_signTypedData*`: EIP-712 document.
    TypedData(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIntent {
    pub note: String,
    pub chain_id: u64,
    pub from: Address,
    pub payload: MessagePayload,
}

/// A request for the custody service to sign something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningIntent {
    Transaction(TransactionIntent),
    Message(MessageIntent),
}

impl SigningIntent {
    pub fn note(&self) -> &str {
        match self {
            SigningIntent::Transaction(tx) => &tx.note,
            SigningIntent::Message(msg) => &msg.note,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            SigningIntent::Transaction(tx) => tx.chain_id,
            SigningIntent::Message(msg) => msg.chain_id,
        }
    }
}

/// Acknowledgement of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAck {
    /// Remote transaction identifier.
    pub id: String,
    pub status: CustodyStatus,
    /// Present when the submission was refused outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One status poll result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub id: String,
    pub status: CustodyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    /// Hex signature for message signing requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Human-readable reason supplied with failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountList {
    pub addresses: Vec<Address>,
}
