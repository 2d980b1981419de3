//! Error types for dialog-registry
//!
//! This module defines the error type returned by registry operations and the
//! smaller error used internally by the hash index.

pub mod registry_errors;

// Re-export main error types
pub use registry_errors::{IndexError, RegistryError, RegistryResult};
