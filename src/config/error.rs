//! Setup-time configuration errors. All of them are fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("network '{network}': custody signing is only supported for public networks")]
    LocalNetwork { network: String },

    #[error("network '{network}': missing required field '{field}'")]
    MissingField {
        network: String,
        field: &'static str,
    },

    #[error("network '{network}': invalid {field}: {reason}")]
    InvalidValue {
        network: String,
        field: &'static str,
        reason: String,
    },

    #[error("network '{network}' is not defined")]
    UnknownNetwork { network: String },

    #[error("network '{network}' has no custody configuration")]
    CustodyNotEnabled { network: String },
}
