//! Replaces header lookups (RFC 3891)

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dialog::{DialogRef, DialogState, ReferState};
use crate::headers::ReplacesHeader;
use crate::routing::{DialogKey, DialogMatcher};
use super::core::DialogRegistry;

/// Outcome of a Replaces lookup
///
/// The application maps these onto its response: 481 for a missing or
/// terminated dialog, 486 for an early-only request against a confirmed
/// dialog, 501 or 481 for non-INVITE dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplacesFailureReason {
    /// No dialog matches the header
    DialogNotFound,
    /// The matching dialog is terminated
    FoundTerminatedDialog,
    /// The matching dialog is hidden or an out-of-dialog REFER artifact
    FoundNonInviteDialog,
    /// The matching dialog is an incoming early dialog
    FoundIncomingEarlyDialog,
    /// The header is early-only and the matching dialog is confirmed
    FoundConfirmedDialog,
    /// The matching dialog may be replaced
    DialogFoundOk,
}

impl ReplacesFailureReason {
    /// Whether the lookup produced a dialog to replace
    pub fn is_ok(&self) -> bool {
        matches!(self, ReplacesFailureReason::DialogFoundOk)
    }
}

impl fmt::Display for ReplacesFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacesFailureReason::DialogNotFound => write!(f, "Dialog not found"),
            ReplacesFailureReason::FoundTerminatedDialog => write!(f, "Found terminated dialog"),
            ReplacesFailureReason::FoundNonInviteDialog => write!(f, "Found non-INVITE dialog"),
            ReplacesFailureReason::FoundIncomingEarlyDialog => {
                write!(f, "Found incoming early dialog")
            }
            ReplacesFailureReason::FoundConfirmedDialog => write!(f, "Found confirmed dialog"),
            ReplacesFailureReason::DialogFoundOk => write!(f, "Dialog found"),
        }
    }
}

impl DialogRegistry {
    /// Find the dialog a Replaces header names and check it may be replaced.
    ///
    /// The dialog is returned only with [`ReplacesFailureReason::DialogFoundOk`].
    /// State, REFER state and the hidden flag are read while the registry is
    /// locked, without taking the matched dialog's lock, so the caller may hold
    /// any dialog guard, including the one the header names.
    pub fn find_by_replaces(
        &self,
        header: &ReplacesHeader,
    ) -> (Option<DialogRef>, ReplacesFailureReason) {
        let key = DialogKey::from_replaces(header);
        let found = self.probe(DialogMatcher::Replaces { key: &key }, |leg| {
            let hidden = leg.identity().read().is_hidden;
            (leg.status(), hidden)
        });
        let Some((dialog, (status, hidden))) = found else {
            debug!(%header, "Did not find a dialog to replace");
            return (None, ReplacesFailureReason::DialogNotFound);
        };

        let reason = self.replaces_verdict(header, status.state, status.refer_state, hidden);
        debug!(
            slot = dialog.slot(),
            state = %status.state,
            hidden,
            reason = %reason,
            "Replaces lookup finished"
        );
        if reason.is_ok() {
            (Some(dialog), reason)
        } else {
            (None, reason)
        }
    }

    fn replaces_verdict(
        &self,
        header: &ReplacesHeader,
        state: DialogState,
        refer_state: ReferState,
        hidden: bool,
    ) -> ReplacesFailureReason {
        if state.is_terminated() {
            return ReplacesFailureReason::FoundTerminatedDialog;
        }
        if hidden || (state.is_idle() && refer_state != ReferState::Idle) {
            return ReplacesFailureReason::FoundNonInviteDialog;
        }
        if !self.config.limit_replaces_validity_checks && state == DialogState::Offering {
            return ReplacesFailureReason::FoundIncomingEarlyDialog;
        }
        if header.early_flag().is_early_only() && !state.is_early() {
            return ReplacesFailureReason::FoundConfirmedDialog;
        }
        ReplacesFailureReason::DialogFoundOk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::dialog::DialogDirection;
    use crate::headers::{EarlyFlag, PartyHeader};

    fn incoming(registry: &DialogRegistry, state: DialogState) -> DialogRef {
        let dialog = registry.create_dialog(DialogDirection::Incoming, false).unwrap();
        {
            let mut guard = dialog.lock().unwrap();
            guard.set_call_id("abc").unwrap();
            guard.set_from(PartyHeader::with_tag_only("111")).unwrap();
            guard.set_to(PartyHeader::with_tag_only("222")).unwrap();
            guard.set_state(state);
            registry.insert(&guard).unwrap();
        }
        dialog
    }

    fn header() -> ReplacesHeader {
        ReplacesHeader::new("abc", Some("111"), Some("222"))
    }

    #[test]
    fn test_connected_dialog_can_be_replaced() {
        let registry = DialogRegistry::new(RegistryConfig::new(2)).unwrap();
        let dialog = incoming(&registry, DialogState::Connected);
        assert_eq!(
            registry.find_by_replaces(&header()),
            (Some(dialog), ReplacesFailureReason::DialogFoundOk)
        );
    }

    #[test]
    fn test_offering_is_rejected_unless_limited() {
        let registry = DialogRegistry::new(RegistryConfig::new(2)).unwrap();
        incoming(&registry, DialogState::Offering);
        assert_eq!(
            registry.find_by_replaces(&header()),
            (None, ReplacesFailureReason::FoundIncomingEarlyDialog)
        );

        let relaxed = RegistryConfig::new(2).with_limited_replaces_checks(true);
        let registry = DialogRegistry::new(relaxed).unwrap();
        incoming(&registry, DialogState::Offering);
        assert!(registry.find_by_replaces(&header()).1.is_ok());
    }

    #[test]
    fn test_early_only_rejects_confirmed() {
        let registry = DialogRegistry::new(RegistryConfig::new(2)).unwrap();
        incoming(&registry, DialogState::Connected);
        let early_only = header().with_early_flag(EarlyFlag::EarlyOnlyEmpty);
        assert_eq!(
            registry.find_by_replaces(&early_only).1,
            ReplacesFailureReason::FoundConfirmedDialog
        );
    }

    #[test]
    fn test_filter_order() {
        let registry = DialogRegistry::new(RegistryConfig::new(1)).unwrap();
        let header = header();
        let verdict =
            |state, refer, hidden| registry.replaces_verdict(&header, state, refer, hidden);

        assert_eq!(
            verdict(DialogState::Terminated, ReferState::Idle, true),
            ReplacesFailureReason::FoundTerminatedDialog
        );
        assert_eq!(
            verdict(DialogState::Connected, ReferState::Idle, true),
            ReplacesFailureReason::FoundNonInviteDialog
        );
        assert_eq!(
            verdict(DialogState::Offering, ReferState::Idle, true),
            ReplacesFailureReason::FoundNonInviteDialog
        );
        assert_eq!(
            verdict(DialogState::Idle, ReferState::Received, false),
            ReplacesFailureReason::FoundNonInviteDialog
        );
        assert_eq!(
            verdict(DialogState::Idle, ReferState::Idle, false),
            ReplacesFailureReason::DialogFoundOk
        );
        assert_eq!(
            verdict(DialogState::Proceeding, ReferState::Idle, false),
            ReplacesFailureReason::DialogFoundOk
        );
    }
}
