//! # DTB Binary Format
//!
//! Little-endian binary form of a node tree, in three header layouts and
//! optionally wrapped in the XOR key-stream cipher.
//!
//! ## Stream Layout
//! ```text
//! [key: i32]          only when encrypted
//! [0x01]              marker
//! [root header]       version-specific, see below
//! [node]*             u32 type tag + payload
//! ```
//!
//! ## Container Headers
//! | Version | Layout                                    |
//! |---------|-------------------------------------------|
//! | 1       | `u16 count, u32 id`                       |
//! | 2       | `u32 0, u32 count, u16 0`                 |
//! | 3       | `u32 1, u16 count, u16 1`                 |
//!
//! The root header uses the same layout as nested containers. A `#define`
//! record takes two slots of its parent's count: the name, then the body.

mod reader;
mod writer;

use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use tracing::debug;

use crate::config::{DecodeConfig, EncodeConfig, CRYPT_KEY_SIZE, DTB_MARKER};
use crate::core::node::{ArrayKind, DataArray};
use crate::error::{DtxError, Result};
use crate::utils::crypto::{generate_key, CryptStream};
use reader::DtbReader;

/// DTB header layout version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DtbVersion {
    V1 = 1,
    V2 = 2,
    #[default]
    V3 = 3,
}

impl DtbVersion {
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DtbVersion {
    type Error = DtxError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(DtbVersion::V1),
            2 => Ok(DtbVersion::V2),
            3 => Ok(DtbVersion::V3),
            other => Err(DtxError::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for DtbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// What detection learned about a DTB stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtbHeader {
    pub version: DtbVersion,
    pub encrypted: bool,
    /// Slot count of the root container
    pub root_count: u32,
}

/// The stream after the marker byte, decrypted if needed.
enum Source<'a, R> {
    Plain(&'a mut R),
    Encrypted(CryptStream<&'a mut R>),
}

impl<R: Read> Read for Source<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Plain(inner) => inner.read(buf),
            Source::Encrypted(inner) => inner.read(buf),
        }
    }
}

/// Consume the marker, probing the cipher if the plain byte is wrong.
fn open_source<R: Read + Seek>(stream: &mut R) -> Result<Source<'_, R>> {
    let start = stream.stream_position()?;
    let mut marker = [0u8; 1];
    match stream.read_exact(&mut marker) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(DtxError::TruncatedInput { offset: 0, need: 1 });
        }
        Err(e) => return Err(e.into()),
    }
    if marker[0] == DTB_MARKER {
        return Ok(Source::Plain(stream));
    }

    stream.seek(SeekFrom::Start(start))?;
    let mut crypt = match CryptStream::open(stream) {
        Ok(crypt) => crypt,
        Err(DtxError::TruncatedInput { .. }) => return Err(DtxError::UnrecognizedHeader),
        Err(e) => return Err(e),
    };
    match crypt.read_exact(&mut marker) {
        Ok(()) if marker[0] == DTB_MARKER => Ok(Source::Encrypted(crypt)),
        Ok(()) => Err(DtxError::UnrecognizedHeader),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(DtxError::UnrecognizedHeader),
        Err(e) => Err(e.into()),
    }
}

fn begin<R: Read + Seek>(
    stream: &mut R,
    max_depth: usize,
) -> Result<(DtbHeader, DtbReader<Source<'_, R>>)> {
    let source = open_source(stream)?;
    let encrypted = matches!(source, Source::Encrypted(_));
    let mut reader = DtbReader::new(source, 1, max_depth);
    let (version, root_count) = reader.read_root_header()?;

    let header = DtbHeader {
        version,
        encrypted,
        root_count,
    };
    debug!(%version, encrypted, root_count, "detected DTB header");
    Ok((header, reader))
}

/// Detect the header of a DTB stream.
///
/// Leaves the stream positioned just after the root header.
pub fn detect_version<R: Read + Seek>(stream: &mut R) -> Result<DtbHeader> {
    begin(stream, DecodeConfig::default().max_depth).map(|(header, _)| header)
}

/// Decode a DTB stream with default settings.
pub fn decode_binary<R: Read + Seek>(stream: &mut R) -> Result<DataArray> {
    decode_binary_with(stream, &DecodeConfig::default())
}

/// Decode a DTB stream into its root array.
pub fn decode_binary_with<R: Read + Seek>(
    stream: &mut R,
    config: &DecodeConfig,
) -> Result<DataArray> {
    let (header, mut reader) = begin(stream, config.max_depth)?;
    let children = reader.read_children(header.version, header.root_count, 0)?;
    Ok(DataArray::with_children(ArrayKind::Array, children))
}

/// Encode a root into `stream`, optionally encrypted with a random key.
///
/// Returns the number of bytes written, key included.
pub fn encode_binary<W: Write + Seek>(
    tree: &DataArray,
    stream: &mut W,
    version: DtbVersion,
    encrypt: bool,
) -> Result<u64> {
    let config = EncodeConfig {
        encrypt,
        ..EncodeConfig::new(version)
    };
    encode_binary_with(tree, stream, &config)
}

/// Encode a root into `stream` according to `config`.
pub fn encode_binary_with<W: Write + Seek>(
    tree: &DataArray,
    stream: &mut W,
    config: &EncodeConfig,
) -> Result<u64> {
    let version = config.dtb_version()?;
    let image = writer::encode(tree, version)?;

    let written = if config.encrypt {
        let key = config.key.unwrap_or_else(generate_key);
        let mut crypt = CryptStream::create(&mut *stream, key)?;
        crypt.write_all(&image)?;
        crypt.flush()?;
        image.len() + CRYPT_KEY_SIZE
    } else {
        stream.write_all(&image)?;
        stream.flush()?;
        image.len()
    };

    debug!(%version, encrypted = config.encrypt, bytes = written, "encoded DTB");
    Ok(written as u64)
}

/// Encode a root into a fresh buffer.
pub fn encode_to_vec(tree: &DataArray, config: &EncodeConfig) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode_binary_with(tree, &mut cursor, config)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::Node;

    fn sample() -> DataArray {
        let mut root = DataArray::array();
        let song = root.push_array(ArrayKind::Array);
        song.push(Node::symbol("song"));
        song.push(Node::float(0.5));
        root.push(Node::string("tail"));
        root
    }

    #[test]
    fn test_version_numbers() {
        assert_eq!(DtbVersion::try_from(2).unwrap(), DtbVersion::V2);
        assert!(matches!(DtbVersion::try_from(4), Err(DtxError::UnsupportedVersion(4))));
        assert_eq!(DtbVersion::default().number(), 3);
        assert_eq!(DtbVersion::V1.to_string(), "v1");
    }

    #[test]
    fn test_detect_plain_and_encrypted() {
        for version in [DtbVersion::V1, DtbVersion::V2, DtbVersion::V3] {
            for encrypt in [false, true] {
                let config = EncodeConfig {
                    encrypt,
                    ..EncodeConfig::new(version)
                };
                let bytes = encode_to_vec(&sample(), &config).unwrap();
                let header = detect_version(&mut Cursor::new(bytes)).unwrap();
                assert_eq!(
                    header,
                    DtbHeader {
                        version,
                        encrypted: encrypt,
                        root_count: 2
                    }
                );
            }
        }
    }

    #[test]
    fn test_encode_returns_size() {
        let mut plain = Cursor::new(Vec::new());
        let size = encode_binary(&sample(), &mut plain, DtbVersion::V3, false).unwrap();
        assert_eq!(size, plain.get_ref().len() as u64);

        let mut encrypted = Cursor::new(Vec::new());
        let size = encode_binary(&sample(), &mut encrypted, DtbVersion::V3, true).unwrap();
        assert_eq!(size, plain.get_ref().len() as u64 + 4);
        assert_eq!(size, encrypted.get_ref().len() as u64);
    }

    #[test]
    fn test_fixed_key_is_stored_in_front() {
        let config = EncodeConfig::new(DtbVersion::V2).encrypted().with_key(0x0BAD_F00D);
        let bytes = encode_to_vec(&sample(), &config).unwrap();
        assert_eq!(&bytes[..4], &0x0BAD_F00Di32.to_le_bytes());
    }

    #[test]
    fn test_marker_key_rejected() {
        let config = EncodeConfig::new(DtbVersion::V3).encrypted().with_key(0x0101);
        assert!(matches!(
            encode_to_vec(&sample(), &config),
            Err(DtxError::InvalidKey(0x0101))
        ));
    }

    #[test]
    fn test_decode_round_trip() {
        let bytes = encode_to_vec(&sample(), &EncodeConfig::default()).unwrap();
        let decoded = decode_binary(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_decode_from_offset() {
        let mut bytes = vec![0xEE; 3];
        let config = EncodeConfig::new(DtbVersion::V1).encrypted();
        bytes.extend(encode_to_vec(&sample(), &config).unwrap());
        let mut cursor = Cursor::new(bytes);
        cursor.set_position(3);
        assert_eq!(decode_binary(&mut cursor).unwrap(), sample());
    }
}
