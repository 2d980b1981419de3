//! Transaction keys and the message abstraction they are extracted from

use std::fmt;
use std::sync::Arc;

use crate::errors::{RegistryError, RegistryResult};
use super::party::PartyHeader;

/// What the registry needs from a SIP message
///
/// Implemented by whatever message type the transaction layer hands over.
/// The registry never looks at raw bytes.
pub trait SipMessage: fmt::Debug + Send + Sync {
    /// Value of the Call-ID header
    fn call_id(&self) -> Option<&str>;

    /// The From header
    fn from_header(&self) -> Option<&PartyHeader>;

    /// The To header
    fn to_header(&self) -> Option<&PartyHeader>;
}

/// Dialog-relevant identifiers extracted from a message by the transaction layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionKey {
    /// Call-ID of the message
    pub call_id: Arc<str>,
    /// From header of the message
    pub from: PartyHeader,
    /// To header of the message
    pub to: PartyHeader,
}

impl TransactionKey {
    /// Creates a new `TransactionKey`.
    pub fn new(call_id: impl Into<Arc<str>>, from: PartyHeader, to: PartyHeader) -> Self {
        Self {
            call_id: call_id.into(),
            from,
            to,
        }
    }

    /// Builds a key from a received or sent message.
    ///
    /// # Returns
    /// An error if the Call-ID, From or To header is missing.
    pub fn from_message(message: &dyn SipMessage) -> RegistryResult<Self> {
        let call_id = message
            .call_id()
            .ok_or_else(|| RegistryError::message_key("message has no Call-ID"))?;
        let from = message
            .from_header()
            .ok_or_else(|| RegistryError::message_key("message has no From header"))?;
        let to = message
            .to_header()
            .ok_or_else(|| RegistryError::message_key("message has no To header"))?;
        Ok(Self::new(call_id, from.clone(), to.clone()))
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call-ID {} From {} To {}", self.call_id, self.from, self.to)
    }
}
