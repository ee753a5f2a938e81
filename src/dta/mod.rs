//! # DTA Text Format
//!
//! Reads the Lisp-like text form into a [`DataArray`] root.
//!
//! ## Components
//! - **Parser**: single-pass character state machine with a container stack
//!
//! ## Entry Points
//! - [`parse_text`]: default settings
//! - [`parse_text_with`]: explicit [`ParseConfig`] (directives, depth limit)
//! - [`parse_text_bytes`]: raw file bytes, honouring an `(encoding utf8)` tag
//!
//! ```rust
//! let root = dtx_codec::parse_text("(name \"Test\") (count 5)").unwrap();
//! assert_eq!(root.len(), 2);
//! ```

pub mod parser;

use tracing::debug;

use crate::config::ParseConfig;
use crate::core::node::DataArray;
use crate::error::Result;

/// Parse DTA text with default settings.
pub fn parse_text(input: &str) -> Result<DataArray> {
    parser::parse(input, &ParseConfig::default())
}

/// Parse DTA text with explicit settings.
pub fn parse_text_with(input: &str, config: &ParseConfig) -> Result<DataArray> {
    parser::parse(input, config)
}

/// Parse DTA file bytes.
///
/// Bytes are read as Latin-1 first. A top-level `(encoding utf8)` entry means
/// the file is UTF-8, so it is decoded and parsed again.
pub fn parse_text_bytes(bytes: &[u8]) -> Result<DataArray> {
    parse_text_bytes_with(bytes, &ParseConfig::default())
}

/// [`parse_text_bytes`] with explicit settings.
pub fn parse_text_bytes_with(bytes: &[u8], config: &ParseConfig) -> Result<DataArray> {
    let latin1: String = bytes.iter().map(|&b| char::from(b)).collect();
    let root = parser::parse(&latin1, config)?;

    if declares_utf8(&root) {
        debug!(len = bytes.len(), "encoding tag found, re-decoding as UTF-8");
        let text = String::from_utf8_lossy(bytes);
        return parser::parse(&text, config);
    }
    Ok(root)
}

fn declares_utf8(root: &DataArray) -> bool {
    root.find_array("encoding")
        .and_then(|entry| entry.get(1))
        .and_then(|value| value.as_symbol())
        .is_some_and(|encoding| encoding.eq_ignore_ascii_case("utf8"))
}
