//! Normalized lookup keys

use std::fmt;
use std::sync::Arc;

use crate::dialog::{DialogDirection, DialogIdentity};
use crate::errors::{RegistryError, RegistryResult};
use crate::headers::{PartyHeader, ReplacesHeader, TransactionKey};

/// Comparable view of a dialog identity, built per lookup
///
/// The From and To headers are kept as the message carried them. Which of
/// the two holds the local tag follows from `direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogKey {
    /// Call-ID
    pub call_id: Arc<str>,

    /// Direction the lookup is made from
    pub direction: DialogDirection,

    /// From header
    pub from: PartyHeader,

    /// To header
    pub to: PartyHeader,
}

impl DialogKey {
    /// Key for a message seen by the transaction layer
    pub fn from_transaction_key(key: &TransactionKey, direction: DialogDirection) -> Self {
        Self {
            call_id: key.call_id.clone(),
            direction,
            from: key.from.clone(),
            to: key.to.clone(),
        }
    }

    /// Key for a record about to be inserted
    pub fn from_identity(identity: &DialogIdentity) -> RegistryResult<Self> {
        let call_id = identity.call_id.clone().ok_or_else(|| {
            RegistryError::illegal_action("dialog has no Call-ID yet and cannot be indexed")
        })?;
        Ok(Self {
            call_id,
            direction: identity.direction,
            from: identity.from.clone(),
            to: identity.to.clone(),
        })
    }

    /// Key for a Replaces header. The header names the dialog as the
    /// receiver of the replacing INVITE sees it, hence `Incoming`.
    pub fn from_replaces(header: &ReplacesHeader) -> Self {
        let party = |tag: Option<&str>| match tag {
            Some(tag) => PartyHeader::with_tag_only(tag),
            None => PartyHeader::default(),
        };
        Self {
            call_id: header.call_id_handle(),
            direction: DialogDirection::Incoming,
            from: party(header.from_tag()),
            to: party(header.to_tag()),
        }
    }

    /// From tag
    pub fn from_tag(&self) -> Option<&str> {
        self.from.tag()
    }

    /// To tag
    pub fn to_tag(&self) -> Option<&str> {
        self.to.tag()
    }

    /// Local tag as seen from `direction`
    pub fn local_tag(&self) -> Option<&str> {
        match self.direction {
            DialogDirection::Outgoing => self.from_tag(),
            DialogDirection::Incoming => self.to_tag(),
        }
    }

    /// Remote tag as seen from `direction`
    pub fn remote_tag(&self) -> Option<&str> {
        match self.direction {
            DialogDirection::Outgoing => self.to_tag(),
            DialogDirection::Incoming => self.from_tag(),
        }
    }
}

impl fmt::Display for DialogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "call-id={} from-tag={} to-tag={} direction={}",
            self.call_id,
            self.from_tag().unwrap_or("-"),
            self.to_tag().unwrap_or("-"),
            self.direction
        )
    }
}
