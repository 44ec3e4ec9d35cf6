//! Normalization of intercepted requests into custody intents.

use alloy::primitives::{Address, Bytes, U256};
use serde::Deserialize;
use serde_json::Value;

use crate::custody::{MessageIntent, MessagePayload, SigningIntent, TransactionIntent};
use crate::rpc::ProviderRequest;
use crate::signer::classifier::{SigningMethod, TypedDataVersion};
use crate::signer::error::SigningError;

/// `eth_sendTransaction` parameter object.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionParams {
    from: Option<Address>,
    to: Option<Address>,
    value: Option<U256>,
    data: Option<Bytes>,
    input: Option<Bytes>,
    gas: Option<U256>,
    gas_price: Option<U256>,
    max_fee_per_gas: Option<U256>,
    max_priority_fee_per_gas: Option<U256>,
    nonce: Option<U256>,
    chain_id: Option<U256>,
}

/// Build the custody intent for a signing request.
///
/// Only called for methods where [`SigningMethod::is_submission`] holds.
pub fn build_intent(
    method: SigningMethod,
    request: &ProviderRequest,
    note: &str,
    chain_id: u64,
) -> Result<SigningIntent, SigningError> {
    let name = request.method.as_str();
    match method {
        SigningMethod::SendTransaction => transaction_intent(request, note, chain_id),
        SigningMethod::PersonalSign => {
            let message = string_param(request, 0)?;
            let from = address_param(request, 1)?;
            Ok(message_intent(note, chain_id, from, MessagePayload::Personal(message)))
        }
        SigningMethod::EthSign => {
            let from = address_param(request, 0)?;
            let message = string_param(request, 1)?;
            Ok(message_intent(note, chain_id, from, MessagePayload::EthSign(message)))
        }
        SigningMethod::SignTypedData(version) => {
            // v1 takes [data, address]; v3/v4 take [address, data].
            let (data_index, from_index) = match version {
                TypedDataVersion::V1 => (0, 1),
                TypedDataVersion::V3 | TypedDataVersion::V4 => (1, 0),
            };
            let from = address_param(request, from_index)?;
            let typed = typed_data_param(request, data_index)?;
            Ok(message_intent(note, chain_id, from, MessagePayload::TypedData(typed)))
        }
        SigningMethod::SignTransaction | SigningMethod::Accounts => Err(SigningError::invalid_params(
            name,
            "method does not create a custody submission",
        )),
    }
}

fn transaction_intent(
    request: &ProviderRequest,
    note: &str,
    chain_id: u64,
) -> Result<SigningIntent, SigningError> {
    let name = request.method.as_str();
    let raw = request
        .param(0)
        .ok_or_else(|| SigningError::invalid_params(name, "missing transaction object"))?;
    let params: TransactionParams = serde_json::from_value(raw.clone())
        .map_err(|e| SigningError::invalid_params(name, e.to_string()))?;

    let data = match (params.data, params.input) {
        (Some(data), Some(input)) if data != input => {
            return Err(SigningError::invalid_params(
                name,
                "both data and input are set with different values",
            ))
        }
        (Some(data), _) => data,
        (None, Some(input)) => input,
        (None, None) => Bytes::new(),
    };

    if let Some(requested) = params.chain_id {
        if requested != U256::from(chain_id) {
            return Err(SigningError::invalid_params(
                name,
                format!("chainId {} does not match network chain id {}", requested, chain_id),
            ));
        }
    }

    if params.to.is_none() && data.is_empty() {
        return Err(SigningError::invalid_params(
            name,
            "contract creation requires data",
        ));
    }

    Ok(SigningIntent::Transaction(TransactionIntent {
        note: note.to_string(),
        chain_id,
        from: params.from,
        to: params.to,
        value: params.value.unwrap_or(U256::ZERO),
        data,
        gas: params.gas,
        gas_price: params.gas_price,
        max_fee_per_gas: params.max_fee_per_gas,
        max_priority_fee_per_gas: params.max_priority_fee_per_gas,
        nonce: params.nonce,
    }))
}

fn message_intent(note: &str, chain_id: u64, from: Address, payload: MessagePayload) -> SigningIntent {
    SigningIntent::Message(MessageIntent {
        note: note.to_string(),
        chain_id,
        from,
        payload,
    })
}

fn address_param(request: &ProviderRequest, index: usize) -> Result<Address, SigningError> {
    let value = request.param(index).ok_or_else(|| {
        SigningError::invalid_params(&request.method, format!("missing address at position {}", index))
    })?;
    serde_json::from_value(value.clone()).map_err(|_| {
        SigningError::invalid_params(&request.method, format!("invalid address at position {}", index))
    })
}

fn string_param(request: &ProviderRequest, index: usize) -> Result<String, SigningError> {
    match request.param(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SigningError::invalid_params(
            &request.method,
            format!("expected a string at position {}", index),
        )),
        None => Err(SigningError::invalid_params(
            &request.method,
            format!("missing message at position {}", index),
        )),
    }
}

/// Typed data arrives either as a JSON document or as a string containing one.
fn typed_data_param(request: &ProviderRequest, index: usize) -> Result<Value, SigningError> {
    match request.param(index) {
        Some(Value::String(s)) => serde_json::from_str(s).map_err(|e| {
            SigningError::invalid_params(&request.method, format!("typed data is not JSON: {}", e))
        }),
        Some(v @ (Value::Object(_) | Value::Array(_))) => Ok(v.clone()),
        Some(_) => Err(SigningError::invalid_params(
            &request.method,
            format!("expected typed data at position {}", index),
        )),
        None => Err(SigningError::invalid_params(
            &request.method,
            format!("missing typed data at position {}", index),
        )),
    }
}
