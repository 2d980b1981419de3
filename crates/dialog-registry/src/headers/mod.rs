//! Header views consumed by the registry
//!
//! Parsing and encoding belong to the SIP message layer. The registry only
//! needs the identity-relevant parts of a few headers: the tag of From/To,
//! the Call-ID, and the fields of a Replaces header (RFC 3891). Strings are
//! shared `Arc<str>` handles so keys and records can reference the same text
//! the message layer owns.

pub mod message;
pub mod party;
pub mod replaces;

pub use message::{SipMessage, TransactionKey};
pub use party::PartyHeader;
pub use replaces::{EarlyFlag, ReplacesHeader};
