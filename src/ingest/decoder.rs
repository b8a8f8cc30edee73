//! Multi-encoding text loading.
//!
//! Student files come from a mix of editors and operating systems, so the
//! bytes are tried against a fixed list of candidate encodings. Each
//! candidate must decode the whole input without a single malformed
//! sequence; the first one that does wins. There is no lossy fallback.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding as RsEncoding, KOI8_R, UTF_8, WINDOWS_1251};
use thiserror::Error;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A candidate text encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Windows1251,
    Koi8R,
    Latin1,
}

impl Encoding {
    /// Priority order: the universal encoding first, then legacy code pages
    pub const CANDIDATES: [Encoding; 4] = [
        Encoding::Utf8,
        Encoding::Windows1251,
        Encoding::Koi8R,
        Encoding::Latin1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Windows1251 => "windows-1251",
            Encoding::Koi8R => "koi8-r",
            Encoding::Latin1 => "iso-8859-1",
        }
    }

    /// Strictly decode `bytes`, returning `None` on any malformed sequence
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                strict(UTF_8, bytes)
            }
            // 0x98 is unassigned in cp1251; encoding_rs passes it through as
            // U+0098, so reject it here to let KOI8-R claim such files.
            Encoding::Windows1251 if bytes.contains(&CP1251_UNASSIGNED) => None,
            Encoding::Windows1251 => strict(WINDOWS_1251, bytes),
            Encoding::Koi8R => strict(KOI8_R, bytes),
            // encoding_rs maps the "iso-8859-1" label to windows-1252, so
            // true Latin-1 goes through the byte-to-code-point helper.
            Encoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
        }
    }
}

const CP1251_UNASSIGNED: u8 = 0x98;

fn strict(encoding: &'static RsEncoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded file content tagged with the encoding that accepted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: Encoding,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file not found or unreadable: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no applicable encoding for {}", path.display())]
    NoApplicableEncoding { path: PathBuf },
}

impl DecodeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DecodeError::NotFound { .. })
    }
}

/// Walk the candidate list over in-memory bytes
pub fn decode_bytes(bytes: &[u8]) -> Option<DecodedText> {
    Encoding::CANDIDATES.into_iter().find_map(|encoding| {
        let text = encoding.decode(bytes);
        if text.is_none() {
            debug!(encoding = %encoding, "Encoding rejected input");
        }
        text.map(|text| DecodedText { text, encoding })
    })
}

/// Read `path` and decode it with the first applicable candidate encoding
pub fn decode(path: impl AsRef<Path>) -> Result<DecodedText, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DecodeError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = decode_bytes(&bytes).ok_or_else(|| DecodeError::NoApplicableEncoding {
        path: path.to_path_buf(),
    })?;

    debug!(
        path = %path.display(),
        encoding = %decoded.encoding,
        bytes = bytes.len(),
        "Decoded file"
    );
    Ok(decoded)
}
