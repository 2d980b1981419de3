//! Tag equality
//!
//! An absent tag is a value of its own: it equals another absent tag and
//! nothing else. The only exception is a record whose peer is known to send
//! no tag at all (RFC 2543); its tag is stored as an explicit empty string and
//! still compares equal to an absent tag.

use crate::headers::PartyHeader;

/// Literal tag value in a Replaces header that also matches an absent tag
pub const WILDCARD_TAG: &str = "0";

/// Byte equality of two optional tags
pub fn tags_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.as_bytes() == b.as_bytes(),
        _ => false,
    }
}

/// Compare a lookup tag against the tag stored on a record header
pub fn tag_matches_record(lookup: Option<&str>, record: &PartyHeader) -> bool {
    match (lookup, record.tag()) {
        (None, Some("")) if record.empty_tag() => true,
        (lookup, stored) => tags_equal(lookup, stored),
    }
}

/// Whether a Replaces tag is the legacy `"0"` wildcard
pub fn is_wildcard(tag: Option<&str>) -> bool {
    tag == Some(WILDCARD_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_not_a_wildcard() {
        assert!(tags_equal(None, None));
        assert!(tags_equal(Some("abc"), Some("abc")));
        assert!(!tags_equal(Some("abc"), None));
        assert!(!tags_equal(None, Some("abc")));
        assert!(!tags_equal(Some("abc"), Some("ABC")));
        assert!(!tags_equal(Some(""), None));
    }

    #[test]
    fn test_empty_tag_sentinel() {
        let mut header = PartyHeader::default();
        header.set_tag("");
        assert!(!tag_matches_record(None, &header));

        header.set_empty_tag(true);
        assert!(tag_matches_record(None, &header));
        assert!(tag_matches_record(Some(""), &header));
        assert!(!tag_matches_record(Some("xyz"), &header));
    }

    #[test]
    fn test_wildcard_literal() {
        assert!(is_wildcard(Some("0")));
        assert!(!is_wildcard(Some("00")));
        assert!(!is_wildcard(None));
    }
}
