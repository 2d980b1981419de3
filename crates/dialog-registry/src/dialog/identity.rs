//! Identity fields of a dialog record
//!
//! RFC 3261 Section 12 identifies a dialog by Call-ID, local tag and remote
//! tag. The record stores the From and To headers of the dialog as they
//! appear on requests it sends (Outgoing) or receives (Incoming), so which of
//! the two carries the local tag depends on [`DialogDirection`].

use std::fmt;
use std::sync::Arc;

use crate::errors::{RegistryError, RegistryResult};
use crate::headers::PartyHeader;
use crate::routing::hash_index::SlotRef;
use super::direction::DialogDirection;

/// Largest number of parameters [`DialogIdentity::params`] may produce
pub const MAX_IDENTITY_PARAMS: usize = 4;

/// Identity of a dialog record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogIdentity {
    /// Direction of the initial request
    pub direction: DialogDirection,

    /// Call-ID, absent until the protocol layer fills it in
    pub call_id: Option<Arc<str>>,

    /// From header of the dialog
    pub from: PartyHeader,

    /// To header of the dialog
    pub to: PartyHeader,

    /// False when the record was created for an additional forked response
    pub is_original: bool,

    /// True when the record only anchors an out-of-dialog subscription
    pub is_hidden: bool,

    /// Back-reference into the hash index
    pub(crate) hash_slot: Option<SlotRef>,
}

impl DialogIdentity {
    /// Empty identity for a new record
    pub fn new(direction: DialogDirection) -> Self {
        Self {
            direction,
            call_id: None,
            from: PartyHeader::default(),
            to: PartyHeader::default(),
            is_original: true,
            is_hidden: false,
            hash_slot: None,
        }
    }

    /// Builder-style Call-ID setter
    pub fn with_call_id(mut self, call_id: impl Into<Arc<str>>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    /// Builder-style From setter
    pub fn with_from(mut self, from: PartyHeader) -> Self {
        self.from = from;
        self
    }

    /// Builder-style To setter
    pub fn with_to(mut self, to: PartyHeader) -> Self {
        self.to = to;
        self
    }

    /// Builder-style hidden flag setter
    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    /// Builder-style original flag setter
    pub fn original(mut self, is_original: bool) -> Self {
        self.is_original = is_original;
        self
    }

    /// Header carrying the local tag
    pub fn local_party(&self) -> &PartyHeader {
        match self.direction {
            DialogDirection::Outgoing => &self.from,
            DialogDirection::Incoming => &self.to,
        }
    }

    /// Header carrying the remote tag
    pub fn remote_party(&self) -> &PartyHeader {
        match self.direction {
            DialogDirection::Outgoing => &self.to,
            DialogDirection::Incoming => &self.from,
        }
    }

    /// Mutable header carrying the local tag
    pub fn local_party_mut(&mut self) -> &mut PartyHeader {
        match self.direction {
            DialogDirection::Outgoing => &mut self.from,
            DialogDirection::Incoming => &mut self.to,
        }
    }

    /// Mutable header carrying the remote tag
    pub fn remote_party_mut(&mut self) -> &mut PartyHeader {
        match self.direction {
            DialogDirection::Outgoing => &mut self.to,
            DialogDirection::Incoming => &mut self.from,
        }
    }

    /// Local tag
    pub fn local_tag(&self) -> Option<&str> {
        self.local_party().tag()
    }

    /// Remote tag
    pub fn remote_tag(&self) -> Option<&str> {
        self.remote_party().tag()
    }

    /// Whether the remote side has chosen a tag, or is known to never send one
    pub fn is_established(&self, empty_tag_accommodation: bool) -> bool {
        let remote = self.remote_party();
        remote.has_tag() || (empty_tag_accommodation && remote.empty_tag())
    }

    /// Whether the record is linked into the hash index
    pub fn is_linked(&self) -> bool {
        self.hash_slot.is_some()
    }

    /// Clear everything except direction and the hidden flag
    pub(crate) fn clear(&mut self) {
        self.call_id = None;
        self.from = PartyHeader::default();
        self.to = PartyHeader::default();
        self.is_original = true;
        self.hash_slot = None;
    }

    /// Identity parameters for structured logging
    pub fn params(&self) -> RegistryResult<IdentityParams> {
        let mut params = IdentityParams::default();
        if let Some(call_id) = &self.call_id {
            params.push(IdentityParam::CallId(call_id.clone()))?;
        }
        if let Some(tag) = self.from.tag_handle() {
            params.push(IdentityParam::FromTag(tag))?;
        }
        if let Some(tag) = self.to.tag_handle() {
            params.push(IdentityParam::ToTag(tag))?;
        }
        params.push(IdentityParam::Direction(self.direction))?;
        Ok(params)
    }
}

/// One identity parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityParam {
    /// Call-ID value
    CallId(Arc<str>),
    /// From tag
    FromTag(Arc<str>),
    /// To tag
    ToTag(Arc<str>),
    /// Dialog direction
    Direction(DialogDirection),
}

impl fmt::Display for IdentityParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityParam::CallId(v) => write!(f, "call-id={}", v),
            IdentityParam::FromTag(v) => write!(f, "from-tag={}", v),
            IdentityParam::ToTag(v) => write!(f, "to-tag={}", v),
            IdentityParam::Direction(d) => write!(f, "direction={}", d),
        }
    }
}

/// Bounded list of identity parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityParams {
    params: Vec<IdentityParam>,
}

impl IdentityParams {
    /// Append a parameter. Going past [`MAX_IDENTITY_PARAMS`] is an invariant violation.
    pub fn push(&mut self, param: IdentityParam) -> RegistryResult<()> {
        if self.params.len() >= MAX_IDENTITY_PARAMS {
            return Err(RegistryError::invariant_violation(format!(
                "identity parameter list overflow: {} already stored, adding {}",
                self.params.len(),
                param
            )));
        }
        self.params.push(param);
        Ok(())
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The parameters in insertion order
    pub fn as_slice(&self) -> &[IdentityParam] {
        &self.params
    }
}

impl fmt::Display for IdentityParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{}", param)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_and_remote_follow_direction() {
        let outgoing = DialogIdentity::new(DialogDirection::Outgoing)
            .with_from(PartyHeader::with_tag_only("local"))
            .with_to(PartyHeader::with_tag_only("remote"));
        assert_eq!(outgoing.local_tag(), Some("local"));
        assert_eq!(outgoing.remote_tag(), Some("remote"));

        let incoming = DialogIdentity::new(DialogDirection::Incoming)
            .with_from(PartyHeader::with_tag_only("remote"))
            .with_to(PartyHeader::with_tag_only("local"));
        assert_eq!(incoming.local_tag(), Some("local"));
        assert_eq!(incoming.remote_tag(), Some("remote"));
    }

    #[test]
    fn test_params_are_bounded() {
        let identity = DialogIdentity::new(DialogDirection::Outgoing)
            .with_call_id("abc@host")
            .with_from(PartyHeader::with_tag_only("111"))
            .with_to(PartyHeader::with_tag_only("222"));
        let mut params = identity.params().unwrap();
        assert_eq!(params.len(), MAX_IDENTITY_PARAMS);
        assert_eq!(
            params.to_string(),
            "call-id=abc@host;from-tag=111;to-tag=222;direction=Outgoing"
        );

        let overflow = params.push(IdentityParam::Direction(DialogDirection::Incoming));
        assert!(matches!(overflow, Err(RegistryError::Internal { .. })));
        assert_eq!(params.len(), MAX_IDENTITY_PARAMS);
    }

    #[test]
    fn test_established_uses_remote_tag() {
        let mut identity = DialogIdentity::new(DialogDirection::Outgoing);
        assert!(!identity.is_established(true));
        identity.to.set_empty_tag(true);
        assert!(identity.is_established(true));
        assert!(!identity.is_established(false));
        identity.to.set_tag("t");
        assert!(identity.is_established(false));

        let incoming = DialogIdentity::new(DialogDirection::Incoming)
            .with_to(PartyHeader::with_tag_only("local"));
        assert!(!incoming.is_established(false));
    }
}
