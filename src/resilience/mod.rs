//! Resilience helpers for waiting on remote work.
//!
//! # Data Flow
//! ```text
//! signer::poller
//!     → backoff.rs (delay before the next status poll)
//!     → deadline.rs (local wall-clock budget)
//! ```
//!
//! # Design Decisions
//! - Only idempotent status polls are ever repeated
//! - Submissions are never retried here: a second submit could mean a
//!   second on-chain transaction
//! - Jittered backoff after poll failures

pub mod backoff;
pub mod deadline;

pub use backoff::{calculate_backoff, BackoffStrategy, PollPolicy};
pub use deadline::Deadline;
