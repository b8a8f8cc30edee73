//! Domain types for rollcall.
//!
//! This module contains the core data structures:
//! - Record: extraction result with optional fields
//! - Student: a record with every field present
//! - StoredStudent: a registry entry with registration metadata

pub mod record;
pub mod student;

// Re-export commonly used types
pub use record::{Field, Record, RecordError, Student};
pub use student::{StoredStudent, StudentKey, DATE_FORMAT, DEFAULT_STATUS};
