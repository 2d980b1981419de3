//! Dialog matching for SIP message routing
//!
//! According to RFC 3261 Section 12, a dialog is identified by:
//! - Call-ID
//! - Local tag (From tag for UAC, To tag for UAS)
//! - Remote tag (To tag for UAC, From tag for UAS)
//!
//! This module turns lookup inputs into a [`DialogKey`], decides whether an
//! existing record matches it through one of the [`DialogMatcher`] policies,
//! and stores records in a fixed-size [`HashIndex`] keyed by Call-ID.

pub mod dialog_key;
pub mod dialog_matcher;
pub mod hash_index;
pub mod tag;

pub use dialog_key::DialogKey;
pub use dialog_matcher::DialogMatcher;
pub use hash_index::{HashIndex, SlotRef};
pub use tag::{tag_matches_record, tags_equal, WILDCARD_TAG};
