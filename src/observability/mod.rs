//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! signer / rpc
//!     → logging.rs (tracing subscriber setup)
//!     → events.rs (per-transition status events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Status events go through a listener trait so operational tooling can
//!   subscribe without parsing logs
//! - Events and metrics never influence signing results

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{StatusEvent, StatusListener, TracingStatusListener};
