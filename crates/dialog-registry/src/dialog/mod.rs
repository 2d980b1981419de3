//! Dialog records and their identity
//!
//! This module contains the record the registry matches messages against:
//!
//! - [`DialogDirection`]: whether the local UA sent or received the initial request
//! - [`DialogState`] / [`ReferState`]: the lifecycle subset the registry filters on
//! - [`DialogIdentity`]: Call-ID, From, To and the flags that steer matching
//! - [`DialogLeg`]: the pooled record, with a dialog-level lock
//! - [`DialogRef`]: a `(record, generation)` pair that fails closed once the
//!   record is reset or released
//!
//! ## Record Lifecycle
//!
//! ```text
//!  create ──► Idle ──insert──► Active (hash-linked) ──reset──► Idle
//!                                    │                         (new generation)
//!                                    └──release──► back to pool (generation 0)
//! ```

pub mod dialog_state;
pub mod direction;
pub mod generation;
pub mod identity;
pub mod leg;

// Re-export main types
pub use dialog_state::{DialogState, ReferState};
pub use direction::DialogDirection;
pub use generation::GenerationId;
pub use identity::{DialogIdentity, IdentityParam, IdentityParams, MAX_IDENTITY_PARAMS};
pub use leg::{DialogGuard, DialogLeg, DialogRef, LegStatus};
