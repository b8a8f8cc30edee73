//! Core persistence logic.
//!
//! This module contains:
//! - Registry: the ordered, key-deduplicated student list
//! - RegistryStore: file-backed load, lookup and insert-if-absent

pub mod registry;

// Re-export commonly used types
pub use registry::{write_registry, InsertError, Registry, RegistryStats, RegistryStore};
