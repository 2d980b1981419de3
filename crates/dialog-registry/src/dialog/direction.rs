//! Dialog direction

use std::fmt;
use serde::{Deserialize, Serialize};

/// Which side sent the request that created the dialog
///
/// For an `Outgoing` dialog the From tag is the local tag and the To tag is
/// the remote tag. For an `Incoming` dialog it is the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogDirection {
    /// The remote UA sent the initial request (UAS side)
    Incoming,
    /// The local UA sent the initial request (UAC side)
    Outgoing,
}

impl DialogDirection {
    /// The other direction
    pub fn opposite(self) -> Self {
        match self {
            DialogDirection::Incoming => DialogDirection::Outgoing,
            DialogDirection::Outgoing => DialogDirection::Incoming,
        }
    }
}

impl fmt::Display for DialogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogDirection::Incoming => write!(f, "Incoming"),
            DialogDirection::Outgoing => write!(f, "Outgoing"),
        }
    }
}
