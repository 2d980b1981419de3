//! # Dialog Registry - RFC 3261 Dialog Identification for RVoIP
//!
//! This crate decides which in-memory dialog (call leg) a SIP message
//! belongs to. It implements the dialog identification rules of RFC 3261
//! Section 12, the forking rules for original and forked dialogs, the
//! Replaces lookup of RFC 3891, and an accommodation for RFC 2543 peers
//! that send no tags.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               DialogRegistry                │
//! │  create / insert / find* / find_by_replaces │
//! ├───────────────────────┬─────────────────────┤
//! │   DialogMatcher       │   LegPool           │
//! │   (five policies)     │   (bounded records) │
//! ├───────────────────────┴─────────────────────┤
//! │       HashIndex (fixed buckets, Call-ID)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Stale references
//!
//! Lookups release the registry lock before returning. A [`DialogRef`]
//! carries the generation captured under the lock, and
//! [`DialogRef::lock`] returns `None` once the record was reset or
//! released in the meantime.
//!
//! ## Quick Start
//!
//! ```
//! use rvoip_dialog_registry::{
//!     DialogDirection, DialogRegistry, PartyHeader, RegistryConfig, TransactionKey,
//! };
//!
//! let registry = DialogRegistry::new(RegistryConfig::new(16)).unwrap();
//! let dialog = registry.create_dialog(DialogDirection::Outgoing, false).unwrap();
//! {
//!     let mut guard = dialog.lock().unwrap();
//!     guard.set_call_id("abc").unwrap();
//!     guard.set_local_tag("111").unwrap();
//!     registry.insert(&guard).unwrap();
//!     guard.set_remote_tag("222").unwrap();
//! }
//!
//! // The peer's view of the same dialog: tags swapped, other direction
//! let key = TransactionKey::new(
//!     "abc",
//!     PartyHeader::with_tag_only("222"),
//!     PartyHeader::with_tag_only("111"),
//! );
//! let found = registry.find(&key, DialogDirection::Incoming, true);
//! assert_eq!(found, Some(dialog));
//! ```

pub mod config;
pub mod dialog;
pub mod errors;
pub mod events;
pub mod headers;
pub mod manager;
pub mod routing;

// Re-export main types
pub use config::{RegistryConfig, ReplacesStatus};
pub use dialog::{
    DialogDirection, DialogGuard, DialogIdentity, DialogLeg, DialogRef, DialogState,
    GenerationId, LegStatus, ReferState,
};
pub use errors::{RegistryError, RegistryResult};
pub use events::{DialogCreatedHandler, TriggeringTransaction};
pub use headers::{EarlyFlag, PartyHeader, ReplacesHeader, SipMessage, TransactionKey};
pub use manager::{DialogRegistry, RegistryResources, ReplacesFailureReason, ResourceUsage};
pub use routing::{DialogKey, DialogMatcher};
