//! Dialog lookups
//!
//! Every lookup probes the Call-ID's bucket under the registry lock with one
//! [`DialogMatcher`] policy and captures the record's generation before the
//! lock is released. The returned [`DialogRef`] fails closed on
//! [`DialogRef::lock`] once the record has been reset or released.

use std::sync::Arc;

use tracing::debug;

use crate::dialog::{DialogDirection, DialogLeg, DialogRef, GenerationId};
use crate::errors::RegistryResult;
use crate::headers::{SipMessage, TransactionKey};
use crate::routing::{DialogKey, DialogMatcher};
use super::core::DialogRegistry;

impl DialogRegistry {
    /// Probe the index with `matcher`
    pub(crate) fn find_with(&self, matcher: DialogMatcher<'_>) -> Option<DialogRef> {
        self.probe(matcher, |_| ()).map(|(dialog, ())| dialog)
    }

    /// Probe the index with `matcher` and run `inspect` on the match while
    /// the registry lock is still held. `inspect` may only take leaf locks.
    pub(crate) fn probe<R>(
        &self,
        matcher: DialogMatcher<'_>,
        inspect: impl FnOnce(&DialogLeg) -> R,
    ) -> Option<(DialogRef, R)> {
        let rfc2543 = self.config.rfc2543_compliant;
        let state = self.state.lock();
        let found = state
            .index
            .find(matcher.call_id(), |leg| {
                matcher.matches(&mut leg.identity().write(), rfc2543)
            })
            .map(|leg| {
                let dialog = DialogRef::new(Arc::clone(leg), leg.generation());
                (dialog, inspect(&**leg))
            });
        drop(state);

        match &found {
            Some((dialog, _)) => debug!(
                policy = matcher.name(),
                slot = dialog.slot(),
                generation = dialog.generation(),
                "Dialog found"
            ),
            None => debug!(
                policy = matcher.name(),
                call_id = matcher.call_id(),
                "No dialog found"
            ),
        }
        found
    }

    /// Find the dialog a message belongs to.
    ///
    /// `direction` is the side the message is seen from. With
    /// `established_only`, records without a remote tag yet are skipped.
    pub fn find(
        &self,
        key: &TransactionKey,
        direction: DialogDirection,
        established_only: bool,
    ) -> Option<DialogRef> {
        let key = DialogKey::from_transaction_key(key, direction);
        self.find_with(DialogMatcher::Exact {
            key: &key,
            established_only,
        })
    }

    /// Find the original outgoing dialog of a request, whatever To tag it
    /// ended up with. Used to tell a forked response from the first one.
    pub fn find_original(
        &self,
        key: &TransactionKey,
        direction: DialogDirection,
    ) -> Option<DialogRef> {
        let key = DialogKey::from_transaction_key(key, direction);
        self.find_with(DialogMatcher::Original { key: &key })
    }

    /// Find a hidden dialog (out-of-dialog subscription anchor)
    pub fn find_hidden(
        &self,
        key: &TransactionKey,
        direction: DialogDirection,
    ) -> Option<DialogRef> {
        if !self.config.hidden_dialogs_enabled {
            return None;
        }
        let key = DialogKey::from_transaction_key(key, direction);
        self.find_with(DialogMatcher::Hidden { key: &key })
    }

    /// Find the original hidden dialog of a request
    pub fn find_original_hidden(
        &self,
        key: &TransactionKey,
        direction: DialogDirection,
    ) -> Option<DialogRef> {
        if !self.config.hidden_dialogs_enabled {
            return None;
        }
        let key = DialogKey::from_transaction_key(key, direction);
        self.find_with(DialogMatcher::OriginalHidden { key: &key })
    }

    /// Find the dialog of a message, returning the generation captured while
    /// the registry was locked.
    ///
    /// # Returns
    /// `MessageKey` error when the message lacks Call-ID, From or To.
    pub fn find_by_message(
        &self,
        message: &dyn SipMessage,
        direction: DialogDirection,
        established_only: bool,
    ) -> RegistryResult<Option<(DialogRef, GenerationId)>> {
        let key = TransactionKey::from_message(message)?;
        Ok(self
            .find(&key, direction, established_only)
            .map(|dialog| {
                let generation = dialog.generation();
                (dialog, generation)
            }))
    }
}
