//! # Canonical Text Rendering
//!
//! Turns nodes back into DTA text that the parser reads into the same tree.
//!
//! ## Layout
//! ```text
//! (name "Test")
//! (song
//!    (tracks 1 2)
//!    (vocals 'lead vox'))
//! ```
//! Leaves are space-joined on the current line; a nested container or define
//! starts a new line one [`INDENT`] deeper. The first line is never indented,
//! so a node's text can be spliced after existing content.

use std::fmt;

use crate::core::node::{Atom, DataArray, Define, Directive, Node};

/// One indentation level
pub const INDENT: &str = "   ";

const DIRECTIVE_KEYWORDS: [&str; 9] = [
    "#ifdef", "#ifndef", "#else", "#endif", "#include", "#merge", "#autorun", "#undef",
    "#define",
];

impl Node {
    /// Render this node at nesting level `indent`.
    pub fn to_text(&self, indent: usize) -> String {
        let mut out = String::new();
        write_node(&mut out, self, indent);
        out
    }
}

impl DataArray {
    /// Render this container, delimiters included, at nesting level `indent`.
    pub fn to_text(&self, indent: usize) -> String {
        let mut out = String::new();
        write_array(&mut out, self, indent);
        out
    }

    /// Render a root as a DTA document: one top-level child per line group.
    pub fn to_dta(&self) -> String {
        let mut out = String::new();
        for child in self.iter() {
            write_node(&mut out, child, 0);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(0))
    }
}

impl fmt::Display for DataArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(0))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_atom(&mut out, self);
        f.write_str(&out)
    }
}

fn write_node(out: &mut String, node: &Node, indent: usize) {
    match node {
        Node::Array(array) => write_array(out, array, indent),
        Node::Atom(atom) => write_atom(out, atom),
        Node::Symbol(name) => write_symbol(out, name),
        // written bare: a name holding whitespace or a delimiter does not re-lex
        Node::Variable(name) => {
            out.push('$');
            out.push_str(name);
        }
        Node::Define(define) => write_define(out, define, indent),
        Node::Directive(directive) => write_directive(out, directive),
    }
}

fn write_array(out: &mut String, array: &DataArray, indent: usize) {
    out.push(array.kind().open_char());
    for (i, child) in array.iter().enumerate() {
        if starts_line(child) {
            out.push('\n');
            push_indent(out, indent + 1);
            write_node(out, child, indent + 1);
        } else {
            if i > 0 {
                out.push(' ');
            }
            write_node(out, child, indent);
        }
    }
    out.push(array.kind().close_char());
}

fn write_atom(out: &mut String, atom: &Atom) {
    match atom {
        Atom::Int(value) => out.push_str(&value.to_string()),
        Atom::Float(value) => write_float(out, *value),
        Atom::String(value) => {
            out.push('"');
            out.push_str(value);
            out.push('"');
        }
    }
}

fn write_float(out: &mut String, value: f32) {
    // Display never switches to exponent notation for f32
    let text = value.to_string();
    out.push_str(&text);
    if value.is_finite() && !text.contains('.') {
        out.push_str(".0");
    }
}

fn write_symbol(out: &mut String, name: &str) {
    if needs_quotes(name) {
        out.push('\'');
        out.push_str(name);
        out.push('\'');
    } else {
        out.push_str(name);
    }
}

fn write_define(out: &mut String, define: &Define, indent: usize) {
    out.push_str("#define ");
    write_symbol(out, &define.name);
    out.push(' ');
    write_array(out, &define.body, indent);
}

fn write_directive(out: &mut String, directive: &Directive) {
    out.push_str(directive.keyword());
    if let Some(argument) = directive.argument() {
        out.push(' ');
        write_symbol(out, argument);
    }
}

fn starts_line(node: &Node) -> bool {
    matches!(node, Node::Array(_) | Node::Define(_))
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

/// Whether a symbol must be quoted to read back as the same symbol.
///
/// Quotes and semicolons only matter at the start of a bare literal, and only
/// ASCII whitespace ends one. A symbol holding both a `'` and a character that
/// forces quoting has no text form.
pub(crate) fn needs_quotes(name: &str) -> bool {
    if name.is_empty() || DIRECTIVE_KEYWORDS.contains(&name) {
        return true;
    }
    if name.starts_with(['\'', '"', ';']) {
        return true;
    }
    if name
        .chars()
        .any(|c| matches!(c, ' ' | '\t' | '\r' | '\n' | '(' | ')' | '[' | ']' | '{' | '}' | '\u{feff}'))
    {
        return true;
    }
    !matches!(Node::from_literal(name), Node::Symbol(_))
}
