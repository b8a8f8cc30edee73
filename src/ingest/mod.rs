//! Text ingestion: decoding files and extracting fields.
//!
//! ```text
//! path ─► decoder::decode ─► DecodedText ─► FieldTable::extract ─► Record
//! ```

pub mod decoder;
pub mod extractor;

pub use decoder::{decode, decode_bytes, DecodeError, DecodedText, Encoding};
pub use extractor::{collect_all, extract, ExtractError, FieldSpec, FieldTable, LabelPattern};
