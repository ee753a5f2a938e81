//! # Data Type Tags
//!
//! The 32-bit type tag that precedes every node in a DTB stream.
//!
//! Tags not listed here (functions, objects, globs) exist in the wider format
//! but have no text form and no node kind; the decoder rejects them.

/// Binary type tag of a DTB node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataType {
    Int = 0x00,
    Float = 0x01,
    Variable = 0x02,
    Symbol = 0x05,
    /// Placeholder slot with a 4-byte payload and no node
    Empty = 0x06,
    IfDef = 0x07,
    Else = 0x08,
    EndIf = 0x09,
    Array = 0x10,
    Command = 0x11,
    String = 0x12,
    Macro = 0x13,
    Define = 0x20,
    Include = 0x21,
    Merge = 0x22,
    IfNDef = 0x23,
    Autorun = 0x24,
    Undef = 0x25,
}

impl DataType {
    /// Get the tag value written to the wire
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Detect the data type from a wire tag
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0x00 => Some(DataType::Int),
            0x01 => Some(DataType::Float),
            0x02 => Some(DataType::Variable),
            0x05 => Some(DataType::Symbol),
            0x06 => Some(DataType::Empty),
            0x07 => Some(DataType::IfDef),
            0x08 => Some(DataType::Else),
            0x09 => Some(DataType::EndIf),
            0x10 => Some(DataType::Array),
            0x11 => Some(DataType::Command),
            0x12 => Some(DataType::String),
            0x13 => Some(DataType::Macro),
            0x20 => Some(DataType::Define),
            0x21 => Some(DataType::Include),
            0x22 => Some(DataType::Merge),
            0x23 => Some(DataType::IfNDef),
            0x24 => Some(DataType::Autorun),
            0x25 => Some(DataType::Undef),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Variable => "variable",
            DataType::Symbol => "symbol",
            DataType::Empty => "empty",
            DataType::IfDef => "ifdef",
            DataType::Else => "else",
            DataType::EndIf => "endif",
            DataType::Array => "array",
            DataType::Command => "command",
            DataType::String => "string",
            DataType::Macro => "macro",
            DataType::Define => "define",
            DataType::Include => "include",
            DataType::Merge => "merge",
            DataType::IfNDef => "ifndef",
            DataType::Autorun => "autorun",
            DataType::Undef => "undef",
        }
    }

    /// Whether a node of this type is followed by a container header
    pub fn is_container(self) -> bool {
        matches!(self, DataType::Array | DataType::Command | DataType::Macro)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
