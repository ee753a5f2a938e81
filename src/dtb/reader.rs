use std::io::{self, Read};

use tracing::warn;

use crate::core::node::{ArrayKind, DataArray, Directive, Node};
use crate::core::types::DataType;
use crate::dtb::DtbVersion;
use crate::error::{constants, DtxError, Result};

/// Sequential little-endian reader over a DTB body.
///
/// `pos` is the logical offset from the marker byte, used for error reports.
pub(crate) struct DtbReader<R> {
    inner: R,
    pos: u64,
    max_depth: usize,
}

impl<R: Read> DtbReader<R> {
    /// Reader positioned `pos` bytes into the stream.
    pub(crate) fn new(inner: R, pos: u64, max_depth: usize) -> Self {
        Self {
            inner,
            pos,
            max_depth,
        }
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.inner.read_exact(&mut bytes).map_err(|e| self.eof_error(e, N))?;
        self.pos += N as u64;
        Ok(bytes)
    }

    fn eof_error(&self, e: io::Error, need: usize) -> DtxError {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => DtxError::TruncatedInput {
                offset: self.pos,
                need,
            },
            _ => DtxError::Io(e),
        }
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_bytes()?))
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_bytes()?))
    }

    /// Skip a 4-byte field that carries no information.
    fn skip_word(&mut self) -> Result<()> {
        self.read_bytes::<4>().map(|_| ())
    }

    /// u32 byte length followed by UTF-8 text.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let start = self.pos;

        // Read through `take` so a bogus length cannot force a huge allocation
        let mut bytes = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut bytes)?;
        if bytes.len() < len {
            return Err(DtxError::TruncatedInput {
                offset: start + bytes.len() as u64,
                need: len - bytes.len(),
            });
        }
        self.pos += len as u64;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(offset = start, len, "invalid UTF-8 in DTB string, replacing");
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }

    /// Root header following the marker byte.
    ///
    /// The layout is told apart from the first word: a zero u16 means
    /// version 2, a u16 equal to the whole u32 means version 3, anything else
    /// is a version 1 count followed by a 32-bit id.
    pub(crate) fn read_root_header(&mut self) -> Result<(DtbVersion, u32)> {
        let word = self.read_u32()?;
        let low = word as u16;

        if low == 0 {
            let count = self.read_u32()?;
            self.read_u16()?;
            Ok((DtbVersion::V2, count))
        } else if u32::from(low) == word {
            let count = self.read_u16()?;
            self.read_u16()?;
            Ok((DtbVersion::V3, u32::from(count)))
        } else {
            // the upper half of `word` was the start of the id
            self.read_u16()?;
            Ok((DtbVersion::V1, u32::from(low)))
        }
    }

    fn read_array_header(&mut self, version: DtbVersion) -> Result<u32> {
        match version {
            DtbVersion::V1 => {
                let count = self.read_u16()?;
                self.skip_word()?;
                Ok(u32::from(count))
            }
            DtbVersion::V2 => {
                self.skip_word()?;
                let count = self.read_u32()?;
                self.read_u16()?;
                Ok(count)
            }
            DtbVersion::V3 => {
                self.skip_word()?;
                let count = self.read_u16()?;
                self.read_u16()?;
                Ok(u32::from(count))
            }
        }
    }

    fn read_array(&mut self, version: DtbVersion, kind: ArrayKind, depth: usize) -> Result<DataArray> {
        if depth > self.max_depth {
            return Err(DtxError::NestingTooDeep {
                depth: self.max_depth,
            });
        }
        let count = self.read_array_header(version)?;
        let children = self.read_children(version, count, depth)?;
        Ok(DataArray::with_children(kind, children))
    }

    /// Decode `count` slots of a container at nesting level `depth`.
    pub(crate) fn read_children(
        &mut self,
        version: DtbVersion,
        count: u32,
        depth: usize,
    ) -> Result<Vec<Node>> {
        // No capacity hint: the count comes straight from the input
        let mut children = Vec::new();
        let mut remaining = count;

        while remaining > 0 {
            remaining -= 1;
            let offset = self.pos;
            let tag = self.read_u32()?;
            let data_type =
                DataType::from_tag(tag).ok_or(DtxError::UnknownNodeKind { tag, offset })?;

            let node = match data_type {
                DataType::Int => Node::int(self.read_i32()?),
                DataType::Float => Node::float(self.read_f32()?),
                DataType::String => Node::string(self.read_string()?),
                DataType::Symbol => Node::symbol(self.read_string()?),
                DataType::Variable => Node::variable(self.read_string()?),
                DataType::Empty => {
                    self.skip_word()?;
                    continue;
                }
                DataType::Array | DataType::Command | DataType::Macro => {
                    let kind = ArrayKind::from_data_type(data_type).unwrap_or_default();
                    Node::Array(self.read_array(version, kind, depth + 1)?)
                }
                DataType::Define => {
                    let name = self.read_string()?;
                    if remaining == 0 {
                        return Err(DtxError::InvalidDefine {
                            offset,
                            message: constants::ERR_DEFINE_WITHOUT_SLOT.to_string(),
                        });
                    }
                    remaining -= 1;

                    let body_offset = self.pos;
                    let body_tag = self.read_u32()?;
                    let Some(kind) = DataType::from_tag(body_tag).and_then(ArrayKind::from_data_type)
                    else {
                        return Err(DtxError::InvalidDefine {
                            offset: body_offset,
                            message: format!(
                                "{} (tag {body_tag:#x})",
                                constants::ERR_DEFINE_BODY_NOT_ARRAY
                            ),
                        });
                    };
                    let body = self.read_array(version, kind, depth + 1)?;
                    Node::define(name, body)
                }
                DataType::IfDef => Directive::IfDef(self.read_string()?).into(),
                DataType::IfNDef => Directive::IfNDef(self.read_string()?).into(),
                DataType::Include => Directive::Include(self.read_string()?).into(),
                DataType::Merge => Directive::Merge(self.read_string()?).into(),
                DataType::Undef => Directive::Undef(self.read_string()?).into(),
                DataType::Else => {
                    self.skip_word()?;
                    Directive::Else.into()
                }
                DataType::EndIf => {
                    self.skip_word()?;
                    Directive::EndIf.into()
                }
                DataType::Autorun => {
                    self.skip_word()?;
                    Directive::Autorun.into()
                }
            };
            children.push(node);
        }

        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &[u8]) -> DtbReader<&[u8]> {
        DtbReader::new(bytes, 1, 16)
    }

    #[test]
    fn test_root_header_layouts() {
        let v1 = [3u8, 0, 1, 0, 0, 0];
        assert_eq!(reader(&v1).read_root_header().unwrap(), (DtbVersion::V1, 3));

        let v2 = [0u8, 0, 0, 0, 7, 0, 0, 0, 0, 0];
        assert_eq!(reader(&v2).read_root_header().unwrap(), (DtbVersion::V2, 7));

        let v3 = [1u8, 0, 0, 0, 5, 0, 1, 0];
        assert_eq!(reader(&v3).read_root_header().unwrap(), (DtbVersion::V3, 5));
    }

    #[test]
    fn test_leaf_payloads() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(-7i32).to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&2.5f32.to_le_bytes());
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(b"foo");
        bytes.extend_from_slice(&6u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);

        let children = reader(&bytes).read_children(DtbVersion::V3, 4, 0).unwrap();
        assert_eq!(
            children,
            vec![Node::int(-7), Node::float(2.5), Node::symbol("foo")]
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x12u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[b'a', 0xFF]);

        let children = reader(&bytes).read_children(DtbVersion::V1, 1, 0).unwrap();
        assert_eq!(children, vec![Node::string("a\u{fffd}")]);
    }

    #[test]
    fn test_huge_string_length_is_truncation() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"abc");

        let err = reader(&bytes).read_children(DtbVersion::V3, 1, 0).unwrap_err();
        assert!(matches!(err, DtxError::TruncatedInput { offset: 12, .. }));
    }

    #[test]
    fn test_unknown_tag_reports_offset() {
        let bytes = 0x03u32.to_le_bytes();
        let err = reader(&bytes).read_children(DtbVersion::V3, 1, 0).unwrap_err();
        assert!(matches!(err, DtxError::UnknownNodeKind { tag: 3, offset: 1 }));
    }

    #[test]
    fn test_depth_limit() {
        // three nested empty arrays in v3 layout
        let mut bytes = Vec::new();
        for count in [1u16, 1, 0] {
            bytes.extend_from_slice(&0x10u32.to_le_bytes());
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(&count.to_le_bytes());
            bytes.extend_from_slice(&1u16.to_le_bytes());
        }
        assert!(DtbReader::new(&bytes[..], 1, 3)
            .read_children(DtbVersion::V3, 1, 0)
            .is_ok());
        assert!(matches!(
            DtbReader::new(&bytes[..], 1, 2).read_children(DtbVersion::V3, 1, 0),
            Err(DtxError::NestingTooDeep { depth: 2 })
        ));
    }
}
