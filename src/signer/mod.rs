//! Custody signing core.
//!
//! # Data Flow
//! ```text
//! ProviderRequest
//!     → classifier.rs (signing or pass-through?)
//!     → normalize.rs (request → SigningIntent)
//!     → custody submit (once)
//!     → state.rs (PendingSubmission, forward-only transitions)
//!     → poller.rs (status polls until terminal / deadline)
//!     → translate.rs (tx hash / signature, or SigningError)
//! ```
//!
//! # Design Decisions
//! - Timeouts bound the local wait only; once submitted, the remote
//!   operation is treated as irrevocable
//! - A timed-out call is reported as unresolved, never as failed

pub mod classifier;
pub mod error;
pub mod normalize;
pub mod poller;
pub mod provider;
pub mod state;
pub mod translate;

pub use classifier::{classify, Classification, SigningMethod, TypedDataVersion};
pub use error::{codes, SigningError};
pub use provider::CustodySigner;
pub use state::{InvalidTransition, PendingSubmission, SubmissionState};
