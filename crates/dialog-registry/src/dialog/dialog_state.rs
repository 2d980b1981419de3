//! Dialog state management
//!
//! The subset of call-leg states the registry needs when it filters a
//! Replaces match.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a dialog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DialogState {
    /// Freshly created or reset, no INVITE yet
    #[default]
    Idle,

    /// INVITE sent, no response yet
    Inviting,

    /// Provisional response received for our INVITE
    Proceeding,

    /// INVITE received, not answered yet (incoming early dialog)
    Offering,

    /// We answered with 2xx, waiting for ACK
    Accepted,

    /// Peer answered with 2xx, ACK not sent yet
    RemoteAccepted,

    /// Dialog confirmed
    Connected,

    /// BYE sent
    Disconnecting,

    /// BYE received or completed
    Disconnected,

    /// Dialog is gone
    Terminated,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialogState::Idle => "Idle",
            DialogState::Inviting => "Inviting",
            DialogState::Proceeding => "Proceeding",
            DialogState::Offering => "Offering",
            DialogState::Accepted => "Accepted",
            DialogState::RemoteAccepted => "RemoteAccepted",
            DialogState::Connected => "Connected",
            DialogState::Disconnecting => "Disconnecting",
            DialogState::Disconnected => "Disconnected",
            DialogState::Terminated => "Terminated",
        };
        write!(f, "{}", name)
    }
}

impl DialogState {
    /// Early dialog: the INVITE transaction has not reached a final answer
    pub fn is_early(&self) -> bool {
        matches!(self, DialogState::Inviting | DialogState::Proceeding | DialogState::Offering)
    }

    /// Check if the dialog is terminated
    pub fn is_terminated(&self) -> bool {
        matches!(self, DialogState::Terminated)
    }

    /// Check if the dialog is idle
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogState::Idle)
    }
}

/// State of a REFER carried on the dialog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReferState {
    /// No REFER in progress
    #[default]
    Idle,
    /// REFER sent
    Sent,
    /// REFER cancelled
    Cancelled,
    /// REFER received
    Received,
}

impl ReferState {
    /// Check if a REFER is in progress
    pub fn is_active(&self) -> bool {
        !matches!(self, ReferState::Idle)
    }
}
