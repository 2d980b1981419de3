//! From/To party header view

use std::fmt;
use std::sync::Arc;

/// The identity-relevant part of a From or To header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyHeader {
    /// Address of the party, kept for diagnostics only
    uri: Option<Arc<str>>,

    /// The `tag` parameter, absent until the party has chosen one
    tag: Option<Arc<str>>,

    /// RFC 2543 marker: the peer sent a final response without a tag, so an
    /// absent tag here is a real (empty) tag rather than "not yet known"
    empty_tag: bool,
}

impl PartyHeader {
    /// Create a party header with an address and no tag
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self {
            uri: Some(uri.into()),
            tag: None,
            empty_tag: false,
        }
    }

    /// Create a header carrying only a tag
    pub fn with_tag_only(tag: impl Into<Arc<str>>) -> Self {
        Self {
            uri: None,
            tag: Some(tag.into()),
            empty_tag: false,
        }
    }

    /// Builder-style tag setter
    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Address of the party, if known
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The tag, if present
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Shared handle to the tag
    pub fn tag_handle(&self) -> Option<Arc<str>> {
        self.tag.clone()
    }

    /// Whether the header carries a tag
    pub fn has_tag(&self) -> bool {
        self.tag.is_some()
    }

    /// Set or replace the tag
    pub fn set_tag(&mut self, tag: impl Into<Arc<str>>) {
        self.tag = Some(tag.into());
    }

    /// Remove the tag
    pub fn clear_tag(&mut self) {
        self.tag = None;
    }

    /// Whether an absent tag must be treated as a real empty tag
    pub fn empty_tag(&self) -> bool {
        self.empty_tag
    }

    /// Mark (or unmark) the absent tag as significant
    pub fn set_empty_tag(&mut self, empty_tag: bool) {
        self.empty_tag = empty_tag;
    }
}

impl fmt::Display for PartyHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.uri, &self.tag) {
            (Some(uri), Some(tag)) => write!(f, "<{}>;tag={}", uri, tag),
            (Some(uri), None) => write!(f, "<{}>", uri),
            (None, Some(tag)) => write!(f, ";tag={}", tag),
            (None, None) => write!(f, "<anonymous>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_header_tag_handling() {
        let mut header = PartyHeader::new("sip:alice@example.com");
        assert!(!header.has_tag());
        assert_eq!(header.to_string(), "<sip:alice@example.com>");

        header.set_tag("a1b2");
        assert_eq!(header.tag(), Some("a1b2"));
        assert_eq!(header.to_string(), "<sip:alice@example.com>;tag=a1b2");

        header.clear_tag();
        assert!(header.tag().is_none());
        assert!(!header.empty_tag());
        header.set_empty_tag(true);
        assert!(header.empty_tag());
    }
}
