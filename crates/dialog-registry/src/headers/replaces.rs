//! Replaces header view (RFC 3891)
//!
//! ```text
//! Replaces: 98asjd8@test.com;to-tag=12345;from-tag=67890;early-only
//! ```
//!
//! The Call-ID and tags identify the dialog to replace. The tags are named
//! from the point of view of the UA that owns the dialog being replaced, so
//! the registry swaps them against its own From/To according to the direction
//! of the candidate dialog.

use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};

/// The `early-only` flag of a Replaces header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EarlyFlag {
    /// Flag absent
    #[default]
    Undefined,
    /// `;early-only`
    EarlyOnlyEmpty,
    /// `;early-only=1`
    EarlyOnlyOne,
    /// `;early-only=true`
    EarlyOnlyTrue,
}

impl EarlyFlag {
    /// Whether the header restricts replacement to early dialogs
    pub fn is_early_only(&self) -> bool {
        !matches!(self, EarlyFlag::Undefined)
    }
}

/// Identity fields of a Replaces header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacesHeader {
    call_id: Arc<str>,
    from_tag: Option<Arc<str>>,
    to_tag: Option<Arc<str>>,
    early_flag: EarlyFlag,
}

impl ReplacesHeader {
    /// Create a Replaces header value
    pub fn new(
        call_id: impl Into<Arc<str>>,
        from_tag: Option<&str>,
        to_tag: Option<&str>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            from_tag: from_tag.map(Arc::from),
            to_tag: to_tag.map(Arc::from),
            early_flag: EarlyFlag::Undefined,
        }
    }

    /// Builder-style early flag setter
    pub fn with_early_flag(mut self, flag: EarlyFlag) -> Self {
        self.early_flag = flag;
        self
    }

    /// The Call-ID of the dialog to replace
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Shared handle to the Call-ID
    pub fn call_id_handle(&self) -> Arc<str> {
        self.call_id.clone()
    }

    /// The `from-tag` parameter
    pub fn from_tag(&self) -> Option<&str> {
        self.from_tag.as_deref()
    }

    /// The `to-tag` parameter
    pub fn to_tag(&self) -> Option<&str> {
        self.to_tag.as_deref()
    }

    /// The `early-only` flag
    pub fn early_flag(&self) -> EarlyFlag {
        self.early_flag
    }
}

impl fmt::Display for ReplacesHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.call_id)?;
        if let Some(tag) = &self.to_tag {
            write!(f, ";to-tag={}", tag)?;
        }
        if let Some(tag) = &self.from_tag {
            write!(f, ";from-tag={}", tag)?;
        }
        match self.early_flag {
            EarlyFlag::Undefined => Ok(()),
            EarlyFlag::EarlyOnlyEmpty => write!(f, ";early-only"),
            EarlyFlag::EarlyOnlyOne => write!(f, ";early-only=1"),
            EarlyFlag::EarlyOnlyTrue => write!(f, ";early-only=true"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_flag_variants() {
        assert!(!EarlyFlag::Undefined.is_early_only());
        assert!(EarlyFlag::EarlyOnlyEmpty.is_early_only());
        assert!(EarlyFlag::EarlyOnlyOne.is_early_only());
        assert!(EarlyFlag::EarlyOnlyTrue.is_early_only());
    }

    #[test]
    fn test_replaces_display() {
        let header = ReplacesHeader::new("98asjd8@test.com", Some("67890"), Some("12345"))
            .with_early_flag(EarlyFlag::EarlyOnlyEmpty);
        assert_eq!(
            header.to_string(),
            "98asjd8@test.com;to-tag=12345;from-tag=67890;early-only"
        );
    }
}
