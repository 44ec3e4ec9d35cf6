//! Request classification.
//!
//! Decides, from the method name alone, whether a call must go through
//! custody. Forwarding a signing method to the node would have it signed
//! (or rejected) with whatever keys the node holds, so anything that signs
//! is listed here explicitly, including methods custody cannot serve.

/// EIP-712 method generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedDataVersion {
    V1,
    V3,
    V4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMethod {
    SendTransaction,
    /// Intercepted but unsupported: custody broadcasts itself.
    SignTransaction,
    EthSign,
    PersonalSign,
    SignTypedData(TypedDataVersion),
    Accounts,
}

impl SigningMethod {
    /// Whether the method goes through the submission state machine.
    pub fn is_submission(&self) -> bool {
        !matches!(self, SigningMethod::Accounts | SigningMethod::SignTransaction)
    }

    /// Whether the custody result is a transaction hash (vs. a signature).
    pub fn yields_transaction_hash(&self) -> bool {
        matches!(self, SigningMethod::SendTransaction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Signing(SigningMethod),
    PassThrough,
    /// Looks signing-related but is not known. Forwarded, with a warning.
    Ambiguous,
}

pub fn classify(method: &str) -> Classification {
    let signing = match method {
        "eth_sendTransaction" => SigningMethod::SendTransaction,
        "eth_signTransaction" => SigningMethod::SignTransaction,
        "eth_sign" => SigningMethod::EthSign,
        "personal_sign" => SigningMethod::PersonalSign,
        "eth_signTypedData" | "eth_signTypedData_v1" => {
            SigningMethod::SignTypedData(TypedDataVersion::V1)
        }
        "eth_signTypedData_v3" => SigningMethod::SignTypedData(TypedDataVersion::V3),
        "eth_signTypedData_v4" => SigningMethod::SignTypedData(TypedDataVersion::V4),
        "eth_accounts" | "eth_requestAccounts" => SigningMethod::Accounts,
        other => {
            return if looks_like_signing(other) {
                Classification::Ambiguous
            } else {
                Classification::PassThrough
            }
        }
    };
    Classification::Signing(signing)
}

fn looks_like_signing(method: &str) -> bool {
    // eth_sendRawTransaction carries an already signed payload.
    if method == "eth_sendRawTransaction" {
        return false;
    }
    method.starts_with("eth_sign")
        || method.starts_with("eth_send")
        || method.starts_with("personal_")
        || method.starts_with("wallet_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_methods_intercepted() {
        for method in [
            "eth_sendTransaction",
            "eth_signTransaction",
            "eth_sign",
            "personal_sign",
            "eth_signTypedData",
            "eth_signTypedData_v1",
            "eth_signTypedData_v3",
            "eth_signTypedData_v4",
            "eth_accounts",
            "eth_requestAccounts",
        ] {
            assert!(
                matches!(classify(method), Classification::Signing(_)),
                "{} must be intercepted",
                method
            );
        }
    }

    #[test]
    fn test_read_methods_pass_through() {
        for method in [
            "eth_blockNumber",
            "eth_call",
            "eth_chainId",
            "eth_getBalance",
            "eth_estimateGas",
            "eth_sendRawTransaction",
            "net_version",
        ] {
            assert_eq!(classify(method), Classification::PassThrough, "{}", method);
        }
    }

    #[test]
    fn test_unknown_defaults_to_pass_through() {
        assert_eq!(classify("debug_traceTransaction"), Classification::PassThrough);
        assert_eq!(classify(""), Classification::PassThrough);
    }

    #[test]
    fn test_suspicious_names_are_ambiguous() {
        assert_eq!(classify("eth_signTypedData_v5"), Classification::Ambiguous);
        assert_eq!(classify("personal_unlockAccount"), Classification::Ambiguous);
        assert_eq!(classify("wallet_sendCalls"), Classification::Ambiguous);
    }

    #[test]
    fn test_method_names_are_case_sensitive() {
        assert_eq!(classify("ETH_SENDTRANSACTION"), Classification::PassThrough);
    }

    #[test]
    fn test_submission_kinds() {
        assert!(SigningMethod::SendTransaction.is_submission());
        assert!(SigningMethod::PersonalSign.is_submission());
        assert!(!SigningMethod::Accounts.is_submission());
        assert!(!SigningMethod::SignTransaction.is_submission());
        assert!(SigningMethod::SendTransaction.yields_transaction_hash());
        assert!(!SigningMethod::EthSign.yields_transaction_hash());
    }
}
