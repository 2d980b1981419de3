//! Creation notification

use tracing::debug;

use crate::dialog::DialogGuard;
use crate::events::TriggeringTransaction;
use super::core::DialogRegistry;

impl DialogRegistry {
    /// Announce a newly created dialog to the registered handler.
    ///
    /// Hidden dialogs that only anchor a subscription are not announced
    /// unless a REFER created them. Each dialog is announced at most once.
    /// Returns whether the handler ran.
    pub fn notify_created(
        &self,
        dialog: &mut DialogGuard<'_>,
        transaction: &dyn TriggeringTransaction,
    ) -> bool {
        if dialog.is_hidden() && !dialog.is_refer() {
            debug!(slot = dialog.slot(), "Hidden dialog is not announced");
            return false;
        }
        if dialog.control_mut().created_notified {
            return false;
        }
        let Some(handler) = self.created_handler.read().clone() else {
            debug!(transaction = transaction.id(), "No dialog-created handler registered");
            return false;
        };

        {
            let control = dialog.control_mut();
            control.created_notified = true;
            control.received_message = transaction.received_message();
            control.active_transaction = Some(transaction.id().to_string());
        }
        debug!(
            transaction = transaction.id(),
            generation = dialog.generation(),
            "Announcing new dialog"
        );
        handler.on_dialog_created(dialog);

        let control = dialog.control_mut();
        control.received_message = None;
        control.active_transaction = None;
        true
    }
}
