//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::guard::{prepare, PreparedConfig};
use crate::config::schema::UserConfig;
use crate::config::ConfigError;

/// Parse a configuration document without validating it.
pub fn parse_config(content: &str) -> Result<UserConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Read and parse a TOML file. The guard has not run yet.
pub fn read_config(path: &Path) -> Result<UserConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load a TOML file and run the configuration guard over it.
pub fn load_config(path: &Path) -> Result<(UserConfig, PreparedConfig), ConfigError> {
    let user = read_config(path)?;
    let prepared = prepare(&user)?;

    tracing::info!(
        path = %path.display(),
        networks = user.networks.len(),
        custody_networks = prepared.len(),
        "Configuration loaded"
    );

    Ok((user, prepared))
}
