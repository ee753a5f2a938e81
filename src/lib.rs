//! # dtx-codec
//!
//! Reader and writer for DTA, a Lisp-like text format for structured data,
//! and DTB, its little-endian binary form.
//!
//! Both forms decode into the same tree: a root [`DataArray`] of [`Node`]s.
//! Text renders back with [`DataArray::to_dta`]; binary output is written in
//! any of the three DTB header layouts, plain or wrapped in the DTB stream
//! cipher.
//!
//! ## Modules
//! - [`core`]: node model, type tags, text rendering
//! - [`dta`]: text parser
//! - [`dtb`]: binary detection, decoding and encoding
//! - [`config`]: parser, codec and logging settings
//! - [`error`]: the crate error type
//! - [`utils`]: stream cipher and logging setup
//!
//! ## Example
//! ```rust
//! use std::io::Cursor;
//! use dtx_codec::{decode_binary, encode_binary, parse_text, DtbVersion};
//!
//! let tree = parse_text("(song (name \"Test\") (tracks 1 2))").unwrap();
//!
//! let mut out = Cursor::new(Vec::new());
//! encode_binary(&tree, &mut out, DtbVersion::V2, true).unwrap();
//!
//! out.set_position(0);
//! let decoded = decode_binary(&mut out).unwrap();
//! assert_eq!(decoded, tree);
//! assert_eq!(decoded.to_dta(), tree.to_dta());
//! ```

pub mod config;
pub mod core;
pub mod dta;
pub mod dtb;
pub mod error;
pub mod utils;

pub use crate::config::{CodecConfig, DecodeConfig, EncodeConfig, LoggingConfig, ParseConfig};
pub use crate::core::{ArrayKind, Atom, DataArray, DataType, Define, Directive, Node};
pub use crate::dta::{parse_text, parse_text_bytes, parse_text_with};
pub use crate::dtb::{
    decode_binary, decode_binary_with, detect_version, encode_binary, encode_binary_with,
    encode_to_vec, DtbHeader, DtbVersion,
};
pub use crate::error::{DtxError, Result};
