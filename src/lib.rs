//! rollcall - student record extraction and registry
//!
//! Reads loosely formatted student files, pulls out the institution, course,
//! full name, group and identifier, and checks the result against a small
//! local registry of known students.
//!
//! # Architecture
//!
//! - Files are decoded by trying a fixed list of encodings in order
//! - Fields are extracted by per-field, ordered label patterns
//! - The registry is a JSON file rewritten atomically on every insert
//!
//! # Modules
//!
//! - `ingest`: Decoding and field extraction
//! - `core`: Registry store (load, lookup, insert-if-absent)
//! - `domain`: Data structures (Record, Student, StoredStudent)
//! - `config`: Path and label configuration
//! - `cli`: Command-line interface and interactive session
//!
//! # Usage
//!
//! ```bash
//! # Interactive menu
//! rollcall
//!
//! # Extract fields from a file
//! rollcall extract card.txt --json
//!
//! # List every name in a batch of files
//! rollcall names 'inbox/*.txt'
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use crate::core::{InsertError, Registry, RegistryStats, RegistryStore};
pub use domain::{Field, Record, StoredStudent, Student, StudentKey};
pub use ingest::{decode, extract, DecodeError, DecodedText, Encoding, FieldTable};
