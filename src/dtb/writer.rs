use bytes::{BufMut, BytesMut};

use crate::config::DTB_MARKER;
use crate::core::node::{Atom, DataArray, Directive, Node};
use crate::core::types::DataType;
use crate::dtb::DtbVersion;
use crate::error::{DtxError, Result};

/// Id written into version 1 container headers.
///
/// Non-zero so a version 1 header never reads as version 3.
const V1_ARRAY_ID: u32 = 1;

/// Tag and trailer written into version 3 container headers.
const V3_ARRAY_TAG: u32 = 1;
const V3_ARRAY_TRAILER: u16 = 1;

/// Serialize a root into an unencrypted DTB image.
pub(crate) fn encode(root: &DataArray, version: DtbVersion) -> Result<BytesMut> {
    let mut writer = DtbWriter {
        buf: BytesMut::with_capacity(256),
        version,
    };
    writer.buf.put_u8(DTB_MARKER);
    writer.put_children(root)?;
    Ok(writer.buf)
}

struct DtbWriter {
    buf: BytesMut,
    version: DtbVersion,
}

impl DtbWriter {
    /// Container header (the root uses the same layout) followed by children.
    fn put_children(&mut self, array: &DataArray) -> Result<()> {
        let count = array.binary_slot_count();
        match self.version {
            DtbVersion::V1 => {
                self.buf.put_u16_le(narrow_u16(count)?);
                self.buf.put_u32_le(V1_ARRAY_ID);
            }
            DtbVersion::V2 => {
                let count = u32::try_from(count)
                    .map_err(|_| oversized("child count", count, u32::MAX as usize))?;
                self.buf.put_u32_le(0);
                self.buf.put_u32_le(count);
                self.buf.put_u16_le(0);
            }
            DtbVersion::V3 => {
                self.buf.put_u32_le(V3_ARRAY_TAG);
                self.buf.put_u16_le(narrow_u16(count)?);
                self.buf.put_u16_le(V3_ARRAY_TRAILER);
            }
        }

        for child in array {
            self.put_node(child)?;
        }
        Ok(())
    }

    fn put_node(&mut self, node: &Node) -> Result<()> {
        self.buf.put_u32_le(node.data_type().tag());
        match node {
            Node::Atom(Atom::Int(value)) => self.buf.put_i32_le(*value),
            Node::Atom(Atom::Float(value)) => self.buf.put_f32_le(*value),
            Node::Atom(Atom::String(text)) | Node::Symbol(text) | Node::Variable(text) => {
                self.put_string(text)?;
            }
            Node::Array(array) => self.put_children(array)?,
            Node::Define(define) => {
                self.put_string(&define.name)?;
                // the body follows as its own container record
                self.buf.put_u32_le(define.body.kind().data_type().tag());
                self.put_children(&define.body)?;
            }
            Node::Directive(directive) => match directive {
                Directive::IfDef(text)
                | Directive::IfNDef(text)
                | Directive::Include(text)
                | Directive::Merge(text)
                | Directive::Undef(text) => self.put_string(text)?,
                Directive::Else | Directive::EndIf | Directive::Autorun => self.buf.put_u32_le(0),
            },
        }
        Ok(())
    }

    fn put_string(&mut self, text: &str) -> Result<()> {
        let len = u32::try_from(text.len())
            .map_err(|_| oversized("string", text.len(), u32::MAX as usize))?;
        self.buf.put_u32_le(len);
        self.buf.put_slice(text.as_bytes());
        Ok(())
    }
}

fn narrow_u16(count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| oversized("child count", count, u16::MAX as usize))
}

fn oversized(what: &'static str, len: usize, max: usize) -> DtxError {
    DtxError::Oversized { what, len, max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::ArrayKind;

    fn sample() -> DataArray {
        let mut root = DataArray::array();
        let array = root.push_array(ArrayKind::Array);
        array.push(Node::symbol("x"));
        root
    }

    #[test]
    fn test_version_headers() {
        let v1 = encode(&sample(), DtbVersion::V1).unwrap();
        assert_eq!(&v1[..7], &[0x01, 1, 0, 1, 0, 0, 0]);

        let v2 = encode(&sample(), DtbVersion::V2).unwrap();
        assert_eq!(&v2[..11], &[0x01, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0]);

        let v3 = encode(&sample(), DtbVersion::V3).unwrap();
        assert_eq!(&v3[..9], &[0x01, 1, 0, 0, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_node_layout() {
        let bytes = encode(&sample(), DtbVersion::V3).unwrap();
        let mut expected = vec![0x01, 1, 0, 0, 0, 1, 0, 1, 0];
        expected.extend_from_slice(&0x10u32.to_le_bytes());
        expected.extend_from_slice(&[1, 0, 0, 0, 1, 0, 1, 0]);
        expected.extend_from_slice(&0x05u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(b'x');
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn test_define_counts_two_slots() {
        let body: DataArray = vec![Node::int(1)].into_iter().collect();
        let root: DataArray = vec![Node::define("ONE", body)].into_iter().collect();
        let bytes = encode(&root, DtbVersion::V3).unwrap();
        assert_eq!(u16::from_le_bytes([bytes[5], bytes[6]]), 2);
    }

    #[test]
    fn test_oversized_count() {
        let root: DataArray = (0..=u16::MAX as i32).map(Node::int).collect();
        assert!(matches!(
            encode(&root, DtbVersion::V3),
            Err(DtxError::Oversized { len: 65536, max: 65535, .. })
        ));
        assert!(encode(&root, DtbVersion::V2).is_ok());
    }
}
