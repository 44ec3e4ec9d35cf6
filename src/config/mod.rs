//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (UserConfig, loosely typed)
//!     → guard.rs (safety checks, defaults, forced fields)
//!     → CustodyConfig (validated, immutable)
//!     → shared via Arc with the signing stage and custody client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once prepared; there is no hot reload
//! - Unsafe settings abort setup instead of warning
//! - Syntactic checks are serde's job, semantic checks are the guard's

pub mod error;
pub mod guard;
pub mod loader;
pub mod schema;

pub use error::ConfigError;
pub use guard::{prepare, Credential, CustodyConfig, PreparedConfig, PreparedNetwork};
pub use loader::{load_config, parse_config, read_config};
pub use schema::{CustodyUserConfig, NetworkUserConfig, ObservabilityConfig, ServerConfig, UserConfig};
