//! Dialog Registry Module
//!
//! This module provides the main DialogRegistry and its operations, split
//! into focused submodules:
//!
//! - `core`: construction, create/insert/remove/reset/release
//! - `lookup`: the find operations
//! - `replaces`: Replaces header lookups and their post-match filters
//! - `notify`: the dialog-created callback
//! - `pool`: the bounded record pool and its counters

// Core registry implementation
pub mod core;

pub mod lookup;
pub mod notify;
pub mod pool;
pub mod replaces;

// Re-export the main DialogRegistry
pub use self::core::DialogRegistry;

// Re-export commonly used types from submodules
pub use pool::{RegistryResources, ResourceUsage};
pub use replaces::ReplacesFailureReason;
