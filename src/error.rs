//! # Error Types
//!
//! Error handling for the DTA/DTB codec.
//!
//! Every failure is returned to the immediate caller as a [`DtxError`]; the codec
//! never hands back a partially built tree.
//!
//! ## Error Categories
//! - **I/O Errors**: failures of the caller-supplied stream
//! - **Text Errors**: malformed DTA, always carrying a 1-based line number
//! - **Binary Errors**: unrecognized headers, unknown type tags, truncated input
//! - **Encoding Errors**: counts or strings that do not fit the selected version
//! - **Configuration Errors**: invalid or unreadable settings
//!
//! ## Example Usage
//! ```rust
//! use dtx_codec::error::DtxError;
//!
//! match dtx_codec::parse_text("(foo ] )") {
//!     Err(DtxError::Parse { line, .. }) => assert_eq!(line, 1),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants shared by the parser and the binary codec.
pub mod constants {
    /// Text parser messages
    pub const ERR_MISMATCHED_BRACE: &str = "Mismatched closing brace";
    pub const ERR_LINE_BREAK_IN_SYMBOL: &str = "Line break encountered in symbol";
    pub const ERR_UNTERMINATED_ARRAY: &str = "Unterminated array";
    pub const ERR_UNTERMINATED_STRING: &str = "Unterminated string";
    pub const ERR_UNTERMINATED_SYMBOL: &str = "Unterminated symbol";
    pub const ERR_INCOMPLETE_DIRECTIVE: &str = "Incomplete directive";

    /// Binary codec messages
    pub const ERR_DEFINE_WITHOUT_SLOT: &str = "define has no slot left for its body";
    pub const ERR_DEFINE_BODY_NOT_ARRAY: &str = "define body is not an array";
}

/// DtxError is the error type for all codec operations
#[derive(Error, Debug)]
pub enum DtxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("DTB contained unrecognized header")]
    UnrecognizedHeader,

    #[error("Unhandled DTB data type {tag:#x} at offset {offset:#x}")]
    UnknownNodeKind { tag: u32, offset: u64 },

    #[error("Unexpected end of data at offset {offset:#x} (need {need} bytes)")]
    TruncatedInput { offset: u64, need: usize },

    #[error("Invalid define at offset {offset:#x}: {message}")]
    InvalidDefine { offset: u64, message: String },

    #[error("Nesting too deep: more than {depth} levels")]
    NestingTooDeep { depth: usize },

    #[error("Unsupported DTB version: {0}")]
    UnsupportedVersion(u8),

    #[error("{what} too large: {len} (maximum {max})")]
    Oversized {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid encryption key {0:#010x}: low byte must not be the DTB marker")]
    InvalidKey(i32),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DtxError {
    /// Build a text parse error at the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        DtxError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Line number of a text parse error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            DtxError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Type alias for Results using DtxError
pub type Result<T> = std::result::Result<T, DtxError>;
