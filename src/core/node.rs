//! # Node Model
//!
//! The typed tree shared by the text parser and the binary codec.
//!
//! A document is a root [`DataArray`] whose children are [`Node`]s. Containers
//! own their children; child order is both display order and encoding order.
//!
//! ```rust
//! use dtx_codec::core::node::{ArrayKind, DataArray, Node};
//!
//! let mut root = DataArray::array();
//! let song = root.push_array(ArrayKind::Array);
//! song.push(Node::symbol("name"));
//! song.push(Node::string("Test"));
//!
//! assert_eq!(root.find_array("name").map(|a| a.len()), Some(2));
//! ```

use crate::core::types::DataType;

/// Delimiter family of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArrayKind {
    /// `( ... )`
    #[default]
    Array,
    /// `{ ... }`
    Command,
    /// `[ ... ]`
    Macro,
}

impl ArrayKind {
    pub fn open_char(self) -> char {
        match self {
            ArrayKind::Array => '(',
            ArrayKind::Command => '{',
            ArrayKind::Macro => '[',
        }
    }

    pub fn close_char(self) -> char {
        match self {
            ArrayKind::Array => ')',
            ArrayKind::Command => '}',
            ArrayKind::Macro => ']',
        }
    }

    /// Container kind opened by `ch`, if it is an open delimiter
    pub fn from_open(ch: char) -> Option<Self> {
        match ch {
            '(' => Some(ArrayKind::Array),
            '{' => Some(ArrayKind::Command),
            '[' => Some(ArrayKind::Macro),
            _ => None,
        }
    }

    /// Container kind closed by `ch`, if it is a close delimiter
    pub fn from_close(ch: char) -> Option<Self> {
        match ch {
            ')' => Some(ArrayKind::Array),
            '}' => Some(ArrayKind::Command),
            ']' => Some(ArrayKind::Macro),
            _ => None,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            ArrayKind::Array => DataType::Array,
            ArrayKind::Command => DataType::Command,
            ArrayKind::Macro => DataType::Macro,
        }
    }

    pub fn from_data_type(data_type: DataType) -> Option<Self> {
        match data_type {
            DataType::Array => Some(ArrayKind::Array),
            DataType::Command => Some(ArrayKind::Command),
            DataType::Macro => Some(ArrayKind::Macro),
            _ => None,
        }
    }
}

/// Leaf value: exactly one of int, float or string.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Int(i32),
    Float(f32),
    String(String),
}

/// Preprocessor-like instruction carried through the tree, never acted upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    IfDef(String),
    IfNDef(String),
    Else,
    EndIf,
    Include(String),
    Merge(String),
    Autorun,
    Undef(String),
}

impl Directive {
    /// Text keyword, including the leading `#`
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::IfDef(_) => "#ifdef",
            Directive::IfNDef(_) => "#ifndef",
            Directive::Else => "#else",
            Directive::EndIf => "#endif",
            Directive::Include(_) => "#include",
            Directive::Merge(_) => "#merge",
            Directive::Autorun => "#autorun",
            Directive::Undef(_) => "#undef",
        }
    }

    /// String constant carried by the directive, if any
    pub fn argument(&self) -> Option<&str> {
        match self {
            Directive::IfDef(arg)
            | Directive::IfNDef(arg)
            | Directive::Include(arg)
            | Directive::Merge(arg)
            | Directive::Undef(arg) => Some(arg),
            Directive::Else | Directive::EndIf | Directive::Autorun => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Directive::IfDef(_) => DataType::IfDef,
            Directive::IfNDef(_) => DataType::IfNDef,
            Directive::Else => DataType::Else,
            Directive::EndIf => DataType::EndIf,
            Directive::Include(_) => DataType::Include,
            Directive::Merge(_) => DataType::Merge,
            Directive::Autorun => DataType::Autorun,
            Directive::Undef(_) => DataType::Undef,
        }
    }
}

/// Named binding: `#define NAME (body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub name: String,
    pub body: DataArray,
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Array, command or macro container
    Array(DataArray),
    Atom(Atom),
    /// Identifier text
    Symbol(String),
    /// Variable name, stored without the `$`
    Variable(String),
    Define(Define),
    Directive(Directive),
}

impl Node {
    pub fn int(value: i32) -> Self {
        Node::Atom(Atom::Int(value))
    }

    pub fn float(value: f32) -> Self {
        Node::Atom(Atom::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Atom(Atom::String(value.into()))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Node::Symbol(name.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable(name.into())
    }

    pub fn define(name: impl Into<String>, body: DataArray) -> Self {
        Node::Define(Define {
            name: name.into(),
            body,
        })
    }

    /// Classify an unquoted text token.
    ///
    /// Integer first, then float, then `$variable`, otherwise symbol. Only
    /// digit-based float syntax is accepted: `NaN`, `inf` and `Infinity` stay
    /// symbols, as does a literal that overflows `f32`.
    pub fn from_literal(text: &str) -> Self {
        if let Ok(value) = text.parse::<i32>() {
            return Node::int(value);
        }
        if looks_numeric(text) {
            if let Ok(value) = text.parse::<f32>() {
                if value.is_finite() {
                    return Node::float(value);
                }
            }
        }
        match text.strip_prefix('$') {
            Some(name) => Node::variable(name),
            None => Node::symbol(text),
        }
    }

    /// Binary type tag of this node
    pub fn data_type(&self) -> DataType {
        match self {
            Node::Array(array) => array.kind().data_type(),
            Node::Atom(Atom::Int(_)) => DataType::Int,
            Node::Atom(Atom::Float(_)) => DataType::Float,
            Node::Atom(Atom::String(_)) => DataType::String,
            Node::Symbol(_) => DataType::Symbol,
            Node::Variable(_) => DataType::Variable,
            Node::Define(_) => DataType::Define,
            Node::Directive(directive) => directive.data_type(),
        }
    }

    pub fn as_array(&self) -> Option<&DataArray> {
        match self {
            Node::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Node::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Node::Atom(Atom::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Node::Atom(Atom::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Atom(Atom::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Number of slots this node takes in a binary child count.
    ///
    /// A define record is followed by its body as a separate slot.
    pub fn binary_slots(&self) -> usize {
        match self {
            Node::Define(_) => 2,
            _ => 1,
        }
    }
}

impl From<DataArray> for Node {
    fn from(array: DataArray) -> Self {
        Node::Array(array)
    }
}

impl From<Directive> for Node {
    fn from(directive: Directive) -> Self {
        Node::Directive(directive)
    }
}

/// Ordered container of nodes, delimited according to its [`ArrayKind`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataArray {
    kind: ArrayKind,
    children: Vec<Node>,
}

impl DataArray {
    pub fn new(kind: ArrayKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: ArrayKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    /// Empty `( )` container
    pub fn array() -> Self {
        Self::new(ArrayKind::Array)
    }

    /// Empty `{ }` container
    pub fn command() -> Self {
        Self::new(ArrayKind::Command)
    }

    /// Empty `[ ]` container
    pub fn macro_definition() -> Self {
        Self::new(ArrayKind::Macro)
    }

    pub fn kind(&self) -> ArrayKind {
        self.kind
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Append a child and return it.
    pub fn push(&mut self, node: Node) -> &mut Node {
        self.children.push(node);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Append an empty container and return it, for building nested trees.
    pub fn push_array(&mut self, kind: ArrayKind) -> &mut DataArray {
        self.children.push(Node::Array(DataArray::new(kind)));
        match self.children.last_mut() {
            Some(Node::Array(array)) => array,
            _ => unreachable!("just pushed an array"),
        }
    }

    /// Text of the first child when it is a symbol or string.
    pub fn name(&self) -> Option<&str> {
        match self.children.first()? {
            Node::Symbol(name) => Some(name),
            Node::Atom(Atom::String(name)) => Some(name),
            _ => None,
        }
    }

    /// First child container of any kind named `name`.
    pub fn find_block(&self, name: &str) -> Option<&DataArray> {
        self.children.iter().find_map(|child| match child {
            Node::Array(array) if array.first_symbol() == Some(name) => Some(array),
            _ => None,
        })
    }

    /// First child `( )` array named `name`.
    pub fn find_array(&self, name: &str) -> Option<&DataArray> {
        self.find_of_kind(ArrayKind::Array, name)
    }

    /// First child `{ }` command named `name`.
    pub fn find_command(&self, name: &str) -> Option<&DataArray> {
        self.find_of_kind(ArrayKind::Command, name)
    }

    /// Child `index` if it is a container.
    pub fn array_at(&self, index: usize) -> Option<&DataArray> {
        self.children.get(index).and_then(Node::as_array)
    }

    /// Children counted the way a DTB header counts them.
    pub fn binary_slot_count(&self) -> usize {
        self.children.iter().map(Node::binary_slots).sum()
    }

    /// Replace child `index`, returning the rewritten container.
    ///
    /// Indices past the end leave the container unchanged.
    pub fn with_child(mut self, index: usize, node: Node) -> Self {
        if let Some(slot) = self.children.get_mut(index) {
            *slot = node;
        }
        self
    }

    /// Same children under a different delimiter family.
    pub fn with_kind(mut self, kind: ArrayKind) -> Self {
        self.kind = kind;
        self
    }

    fn first_symbol(&self) -> Option<&str> {
        self.children.first().and_then(Node::as_symbol)
    }

    fn find_of_kind(&self, kind: ArrayKind, name: &str) -> Option<&DataArray> {
        self.children.iter().find_map(|child| match child {
            Node::Array(array) if array.kind == kind && array.first_symbol() == Some(name) => {
                Some(array)
            }
            _ => None,
        })
    }
}

/// Digits with optional sign, decimal point and exponent.
///
/// Keeps words like `inf` or `nan` out of float classification.
pub(crate) fn looks_numeric(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

impl<'a> IntoIterator for &'a DataArray {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl FromIterator<Node> for DataArray {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::with_children(ArrayKind::Array, iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> DataArray {
        let mut root = DataArray::array();
        let name = root.push_array(ArrayKind::Array);
        name.push(Node::symbol("name"));
        name.push(Node::string("Test"));
        let cmd = root.push_array(ArrayKind::Command);
        cmd.push(Node::symbol("name"));
        cmd.push(Node::int(1));
        root.push(Node::symbol("loose"));
        root
    }

    #[test]
    fn test_push_returns_appended_node() {
        let mut root = DataArray::array();
        let node = root.push(Node::int(7));
        assert_eq!(node.as_int(), Some(7));

        let inner = root.push_array(ArrayKind::Macro);
        inner.push(Node::symbol("x"));
        assert_eq!(root.len(), 2);
        assert_eq!(root.array_at(1).map(DataArray::kind), Some(ArrayKind::Macro));
    }

    #[test]
    fn test_find_by_kind() {
        let root = song();
        let array = root.find_array("name").expect("array");
        assert_eq!(array.kind(), ArrayKind::Array);
        assert_eq!(array.get(1).and_then(Node::as_str), Some("Test"));

        let command = root.find_command("name").expect("command");
        assert_eq!(command.get(1).and_then(Node::as_int), Some(1));

        assert!(root.find_array("missing").is_none());
        assert_eq!(root.find_block("name").map(DataArray::kind), Some(ArrayKind::Array));
    }

    #[test]
    fn test_name_accepts_symbol_or_string() {
        let named: DataArray = vec![Node::string("title"), Node::int(3)].into_iter().collect();
        assert_eq!(named.name(), Some("title"));
        let unnamed: DataArray = vec![Node::int(3)].into_iter().collect();
        assert_eq!(unnamed.name(), None);
    }

    #[test]
    fn test_define_takes_two_slots() {
        let mut root = DataArray::array();
        root.push(Node::define("FOO", DataArray::array()));
        root.push(Node::int(1));
        assert_eq!(root.len(), 2);
        assert_eq!(root.binary_slot_count(), 3);
    }

    #[test]
    fn test_builder_rewrites() {
        let root = song().with_child(2, Node::int(9)).with_kind(ArrayKind::Command);
        assert_eq!(root.kind(), ArrayKind::Command);
        assert_eq!(root.get(2).and_then(Node::as_int), Some(9));

        let unchanged = song().with_child(99, Node::int(1));
        assert_eq!(unchanged, song());
    }

    #[test]
    fn test_data_types() {
        assert_eq!(Node::int(1).data_type(), DataType::Int);
        assert_eq!(Node::float(1.0).data_type(), DataType::Float);
        assert_eq!(Node::string("").data_type(), DataType::String);
        assert_eq!(Node::variable("v").data_type(), DataType::Variable);
        assert_eq!(Node::from(DataArray::command()).data_type(), DataType::Command);
        assert_eq!(Node::from(Directive::Autorun).data_type(), DataType::Autorun);
        assert_eq!(Directive::Include("a.dta".into()).argument(), Some("a.dta"));
        assert_eq!(Directive::EndIf.argument(), None);
    }

    #[test]
    fn test_literal_classification() {
        assert_eq!(Node::from_literal("42"), Node::int(42));
        assert_eq!(Node::from_literal("-7"), Node::int(-7));
        assert_eq!(Node::from_literal("3.14"), Node::float(3.14));
        assert_eq!(Node::from_literal("1e3"), Node::float(1000.0));
        // out of int32 range falls through to float
        assert_eq!(Node::from_literal("4294967296"), Node::float(4294967296.0));
        assert_eq!(Node::from_literal("$health"), Node::variable("health"));
        assert_eq!(Node::from_literal("bar"), Node::symbol("bar"));
        assert_eq!(Node::from_literal("inf"), Node::symbol("inf"));
        assert_eq!(Node::from_literal("nan"), Node::symbol("nan"));
        assert_eq!(Node::from_literal("-"), Node::symbol("-"));
        assert_eq!(Node::from_literal("1.2.3"), Node::symbol("1.2.3"));
        // overflowing f32 stays a symbol
        assert_eq!(Node::from_literal("1e39"), Node::symbol("1e39"));
        assert_eq!(Node::from_literal("-5e40"), Node::symbol("-5e40"));
    }

    #[test]
    fn test_delimiters() {
        for kind in [ArrayKind::Array, ArrayKind::Command, ArrayKind::Macro] {
            assert_eq!(ArrayKind::from_open(kind.open_char()), Some(kind));
            assert_eq!(ArrayKind::from_close(kind.close_char()), Some(kind));
            assert_eq!(ArrayKind::from_data_type(kind.data_type()), Some(kind));
        }
        assert_eq!(ArrayKind::from_open(')'), None);
    }
}
