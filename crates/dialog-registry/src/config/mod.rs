//! Configuration for the dialog registry
//!
//! The registry is sized once at construction and never grows. Every value
//! here is read-only after [`DialogRegistry::new`](crate::manager::DialogRegistry::new).
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_dialog_registry::config::RegistryConfig;
//!
//! let config = RegistryConfig::new(500)
//!     .with_hidden_dialogs(50)
//!     .with_limited_replaces_checks(true);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.total_capacity(), 550);
//! ```

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::errors::{RegistryError, RegistryResult};

/// How the application advertises support for the Replaces extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReplacesStatus {
    /// Nothing advertised
    Undefined,
    /// Replaces listed in Supported
    #[default]
    Supported,
    /// Replaces listed in Require
    Required,
}

impl fmt::Display for ReplacesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacesStatus::Undefined => write!(f, "Undefined"),
            ReplacesStatus::Supported => write!(f, "Supported"),
            ReplacesStatus::Required => write!(f, "Required"),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of normal (INVITE) dialogs alive at once
    pub max_dialogs: usize,

    /// Maximum number of hidden dialogs (out-of-dialog subscriptions)
    pub max_hidden_dialogs: usize,

    /// Whether hidden dialogs exist at all
    pub hidden_dialogs_enabled: bool,

    /// Skip the "offering state" Replaces filter, for peers that replace
    /// incoming early dialogs
    pub limit_replaces_validity_checks: bool,

    /// Treat a missing remote tag on a final response as a real empty tag
    /// (RFC 2543 peers)
    pub rfc2543_compliant: bool,

    /// Replaces support advertised to the application
    pub replaces_status: ReplacesStatus,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_dialogs: 1000,
            max_hidden_dialogs: 0,
            hidden_dialogs_enabled: false,
            limit_replaces_validity_checks: false,
            rfc2543_compliant: true,
            replaces_status: ReplacesStatus::Supported,
        }
    }
}

impl RegistryConfig {
    /// Create a configuration for `max_dialogs` normal dialogs and no hidden ones
    pub fn new(max_dialogs: usize) -> Self {
        Self {
            max_dialogs,
            ..Default::default()
        }
    }

    /// Enable hidden dialogs with the given capacity
    pub fn with_hidden_dialogs(mut self, max_hidden_dialogs: usize) -> Self {
        self.hidden_dialogs_enabled = true;
        self.max_hidden_dialogs = max_hidden_dialogs;
        self
    }

    /// Disable (`true`) or keep (`false`) the offering-state Replaces filter
    pub fn with_limited_replaces_checks(mut self, limited: bool) -> Self {
        self.limit_replaces_validity_checks = limited;
        self
    }

    /// Toggle the RFC 2543 empty-tag accommodation
    pub fn with_rfc2543_compliance(mut self, enabled: bool) -> Self {
        self.rfc2543_compliant = enabled;
        self
    }

    /// Set the advertised Replaces status
    pub fn with_replaces_status(mut self, status: ReplacesStatus) -> Self {
        self.replaces_status = status;
        self
    }

    /// Hidden capacity that is actually usable
    pub fn effective_hidden_capacity(&self) -> usize {
        if self.hidden_dialogs_enabled {
            self.max_hidden_dialogs
        } else {
            0
        }
    }

    /// Total number of records the registry may hold
    pub fn total_capacity(&self) -> usize {
        self.max_dialogs + self.effective_hidden_capacity()
    }

    /// Bucket count for the hash index: twice the total capacity, at least one
    pub fn hash_bucket_count(&self) -> usize {
        (self.total_capacity() * 2).max(1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> RegistryResult<()> {
        if !self.hidden_dialogs_enabled && self.max_hidden_dialogs > 0 {
            return Err(RegistryError::configuration(format!(
                "max_hidden_dialogs is {} but hidden dialogs are disabled",
                self.max_hidden_dialogs
            )));
        }
        Ok(())
    }
}
