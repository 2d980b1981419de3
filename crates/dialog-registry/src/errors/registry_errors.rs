//! Registry error definitions
//!
//! Capacity and lifecycle errors are always returned to the caller. The
//! registry never retries and never swallows them. "No matching dialog" is not
//! an error: lookups return `None` for that.

use thiserror::Error;
use tracing::error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors produced by the dialog registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A bounded resource (dialog pool, hash index) is exhausted, or an insert
    /// collided with a dialog that already has the same identity.
    #[error("Out of resources ({resource}): {message}")]
    OutOfResources {
        /// Which resource ran out
        resource: &'static str,
        /// Human-readable error message
        message: String,
    },

    /// The operation assumes a lifecycle state the dialog is not in.
    #[error("Illegal action: {message}")]
    IllegalAction {
        /// Human-readable error message
        message: String,
    },

    /// Internal bookkeeping mismatch. Indicates a programming defect.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message
        message: String,
    },

    /// Invalid registry configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message
        message: String,
    },

    /// A message did not carry the headers needed for a transaction key
    #[error("Cannot build transaction key: {message}")]
    MessageKey {
        /// Human-readable error message
        message: String,
    },
}

impl RegistryError {
    /// Create an out-of-resources error
    pub fn out_of_resources(resource: &'static str, message: impl Into<String>) -> Self {
        Self::OutOfResources {
            resource,
            message: message.into(),
        }
    }

    /// Create an illegal-action error
    pub fn illegal_action(message: impl Into<String>) -> Self {
        Self::IllegalAction {
            message: message.into(),
        }
    }

    /// Create an internal error and log it at exception severity.
    ///
    /// Every invariant violation goes through here so the log always carries
    /// the `exception` marker.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(exception = true, "Invariant violation: {}", message);
        Self::Internal { message }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a message-key error
    pub fn message_key(message: impl Into<String>) -> Self {
        Self::MessageKey {
            message: message.into(),
        }
    }

    /// True for errors caused by a configured capacity being reached
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Self::OutOfResources { .. })
    }

    /// True when the caller can sensibly react (reject the request, retry
    /// later). Internal errors have no defined recovery.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal { .. } | Self::Configuration { .. })
    }
}

/// Errors returned by the hash index itself
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// An element equal under the uniqueness comparator is already linked
    #[error("an equal element is already present")]
    AlreadyPresent,

    /// The index holds as many elements as it was sized for
    #[error("hash index is full")]
    Full,
}

impl From<IndexError> for RegistryError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::AlreadyPresent => RegistryError::out_of_resources(
                "dialog hash",
                "a dialog with the same identity is already registered",
            ),
            IndexError::Full => {
                RegistryError::out_of_resources("dialog hash", "no free hash entries")
            }
        }
    }
}
