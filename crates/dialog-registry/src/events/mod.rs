//! Application callbacks
//!
//! The registry announces dialogs created by the stack (an incoming INVITE,
//! a forked response, a REFER) through [`DialogCreatedHandler`]. The
//! transaction that caused the creation is described by
//! [`TriggeringTransaction`].

use std::sync::Arc;

use crate::dialog::DialogGuard;
use crate::headers::SipMessage;

/// Receives newly created dialogs
pub trait DialogCreatedHandler: Send + Sync {
    /// Called once per visible dialog, with the dialog locked.
    ///
    /// [`DialogGuard::received_message`] and
    /// [`DialogGuard::active_transaction`] are only set for the duration of
    /// this call.
    fn on_dialog_created(&self, dialog: &mut DialogGuard<'_>);
}

/// The transaction whose message created a dialog
pub trait TriggeringTransaction {
    /// Transaction identifier, for logging and for the callback
    fn id(&self) -> &str;

    /// The message the transaction received, if any
    fn received_message(&self) -> Option<Arc<dyn SipMessage>>;
}
