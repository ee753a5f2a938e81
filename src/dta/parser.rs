use crate::config::ParseConfig;
use crate::core::node::{ArrayKind, Atom, DataArray, Define, Directive, Node};
use crate::error::{constants, DtxError, Result};

/// Tokenizer state between characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Whitespace,
    InString,
    InLiteral,
    InSymbol,
    InComment,
}

/// An open container. The frame below it on the stack is its parent.
struct Frame {
    kind: ArrayKind,
    children: Vec<Node>,
    /// Set when this container is the body of `#define NAME`
    define: Option<String>,
    /// Line where the open delimiter appeared
    line: usize,
}

impl Frame {
    fn new(kind: ArrayKind, line: usize) -> Self {
        Self {
            kind,
            children: Vec::new(),
            define: None,
            line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    IfDef,
    IfNDef,
    Else,
    EndIf,
    Include,
    Merge,
    Autorun,
    Undef,
    Define,
}

impl Keyword {
    fn from_literal(text: &str) -> Option<Self> {
        match text {
            "#ifdef" => Some(Keyword::IfDef),
            "#ifndef" => Some(Keyword::IfNDef),
            "#else" => Some(Keyword::Else),
            "#endif" => Some(Keyword::EndIf),
            "#include" => Some(Keyword::Include),
            "#merge" => Some(Keyword::Merge),
            "#autorun" => Some(Keyword::Autorun),
            "#undef" => Some(Keyword::Undef),
            "#define" => Some(Keyword::Define),
            _ => None,
        }
    }

    fn with_argument(self, argument: String) -> Directive {
        match self {
            Keyword::IfDef => Directive::IfDef(argument),
            Keyword::IfNDef => Directive::IfNDef(argument),
            Keyword::Include => Directive::Include(argument),
            Keyword::Merge => Directive::Merge(argument),
            Keyword::Undef => Directive::Undef(argument),
            Keyword::Else => Directive::Else,
            Keyword::EndIf => Directive::EndIf,
            Keyword::Autorun => Directive::Autorun,
            Keyword::Define => unreachable!("#define is assembled from its body frame"),
        }
    }
}

/// Directive waiting for more tokens.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    Argument(Keyword),
    DefineName,
    DefineBody(String),
}

/// Parser state: the open container stack plus the token being accumulated.
struct Parser<'c> {
    config: &'c ParseConfig,
    stack: Vec<Frame>,
    state: State,
    token: String,
    pending: Pending,
    line: usize,
}

/// Parse DTA text into a root array.
pub fn parse(input: &str, config: &ParseConfig) -> Result<DataArray> {
    let mut parser = Parser {
        config,
        stack: vec![Frame::new(ArrayKind::Array, 1)],
        state: State::Whitespace,
        token: String::new(),
        pending: Pending::None,
        line: 1,
    };

    // the trailing space flushes a literal that runs to the end of input
    for ch in input.chars().chain(std::iter::once(' ')) {
        parser.step(ch)?;
    }
    parser.finish()
}

impl Parser<'_> {
    fn step(&mut self, ch: char) -> Result<()> {
        if ch == '\u{feff}' {
            return Ok(());
        }
        if ch == '\n' {
            self.line += 1;
        }

        match self.state {
            State::Whitespace => match ch {
                '\'' => self.begin(State::InSymbol),
                '"' => self.begin(State::InString),
                ';' => self.begin(State::InComment),
                ' ' | '\r' | '\n' | '\t' => {}
                ')' | '}' | ']' => self.close(ch)?,
                '(' | '{' | '[' => self.open(ch)?,
                _ => {
                    self.begin(State::InLiteral);
                    self.token.push(ch);
                }
            },
            State::InString => match ch {
                '"' => {
                    let text = self.take_token();
                    self.add_quoted(Node::string(text))?;
                }
                _ => self.token.push(ch),
            },
            State::InLiteral => match ch {
                ' ' | '\r' | '\n' | '\t' => {
                    let text = self.take_token();
                    self.add_literal(text)?;
                }
                ')' | '}' | ']' => {
                    let text = self.take_token();
                    self.add_literal(text)?;
                    self.close(ch)?;
                }
                '(' | '{' | '[' => {
                    let text = self.take_token();
                    self.add_literal(text)?;
                    self.open(ch)?;
                }
                _ => self.token.push(ch),
            },
            State::InSymbol => match ch {
                '\r' | '\n' => {
                    return Err(DtxError::parse(self.line, constants::ERR_LINE_BREAK_IN_SYMBOL));
                }
                ')' | '}' | ']' => {
                    let text = self.take_token();
                    self.add_quoted(Node::symbol(text))?;
                    self.close(ch)?;
                }
                '\'' => {
                    let text = self.take_token();
                    self.add_quoted(Node::symbol(text))?;
                }
                _ => self.token.push(ch),
            },
            State::InComment => {
                if ch == '\r' || ch == '\n' {
                    self.state = State::Whitespace;
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<DataArray> {
        match self.state {
            State::InString => {
                return Err(DtxError::parse(self.line, constants::ERR_UNTERMINATED_STRING))
            }
            State::InSymbol => {
                return Err(DtxError::parse(self.line, constants::ERR_UNTERMINATED_SYMBOL))
            }
            _ => {}
        }
        if !matches!(self.pending, Pending::None) {
            return Err(DtxError::parse(
                self.line,
                format!("{} at end of input", constants::ERR_INCOMPLETE_DIRECTIVE),
            ));
        }
        if self.stack.len() > 1 {
            let open = &self.stack[self.stack.len() - 1];
            return Err(DtxError::parse(
                open.line,
                format!(
                    "{}: '{}' is never closed",
                    constants::ERR_UNTERMINATED_ARRAY,
                    open.kind.open_char()
                ),
            ));
        }
        let root = self.stack.pop().map(|frame| frame.children).unwrap_or_default();
        Ok(DataArray::with_children(ArrayKind::Array, root))
    }

    fn begin(&mut self, state: State) {
        self.token.clear();
        self.state = state;
    }

    fn take_token(&mut self) -> String {
        self.state = State::Whitespace;
        std::mem::take(&mut self.token)
    }

    fn current(&mut self) -> &mut Frame {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    fn open(&mut self, ch: char) -> Result<()> {
        let Some(kind) = ArrayKind::from_open(ch) else {
            return Ok(());
        };
        if self.stack.len() > self.config.max_depth {
            return Err(DtxError::NestingTooDeep {
                depth: self.config.max_depth,
            });
        }
        let mut frame = Frame::new(kind, self.line);
        match std::mem::take(&mut self.pending) {
            Pending::None => {}
            Pending::DefineBody(name) => frame.define = Some(name),
            Pending::Argument(_) | Pending::DefineName => {
                return Err(self.incomplete_directive(ch));
            }
        }
        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self, ch: char) -> Result<()> {
        if !matches!(self.pending, Pending::None) {
            return Err(self.incomplete_directive(ch));
        }
        let top_kind = self.stack.last().map(|frame| frame.kind);
        if ArrayKind::from_close(ch) != top_kind || self.stack.len() == 1 {
            return Err(DtxError::parse(
                self.line,
                format!("{} '{}'", constants::ERR_MISMATCHED_BRACE, ch),
            ));
        }
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        let body = DataArray::with_children(frame.kind, frame.children);
        let node = match frame.define {
            Some(name) => Node::Define(Define { name, body }),
            None => Node::Array(body),
        };
        self.current().children.push(node);
        Ok(())
    }

    /// Flush an unquoted token.
    fn add_literal(&mut self, text: String) -> Result<()> {
        if self.config.directives {
            if matches!(self.pending, Pending::None) {
                if let Some(keyword) = Keyword::from_literal(&text) {
                    return self.begin_directive(keyword);
                }
            } else {
                return self.directive_argument(text);
            }
        }
        let node = Node::from_literal(&text);
        self.current().children.push(node);
        Ok(())
    }

    /// Flush a quoted symbol or string.
    fn add_quoted(&mut self, node: Node) -> Result<()> {
        if !matches!(self.pending, Pending::None) {
            let text = match node {
                Node::Symbol(text) => text,
                Node::Atom(Atom::String(text)) => text,
                other => other.to_text(0),
            };
            return self.directive_argument(text);
        }
        self.current().children.push(node);
        Ok(())
    }

    fn begin_directive(&mut self, keyword: Keyword) -> Result<()> {
        match keyword {
            Keyword::Else | Keyword::EndIf | Keyword::Autorun => {
                let directive = keyword.with_argument(String::new());
                self.current().children.push(Node::Directive(directive));
            }
            Keyword::Define => self.pending = Pending::DefineName,
            _ => self.pending = Pending::Argument(keyword),
        }
        Ok(())
    }

    fn directive_argument(&mut self, text: String) -> Result<()> {
        match std::mem::take(&mut self.pending) {
            Pending::None => Ok(()),
            Pending::Argument(keyword) => {
                let directive = keyword.with_argument(text);
                self.current().children.push(Node::Directive(directive));
                Ok(())
            }
            Pending::DefineName => {
                self.pending = Pending::DefineBody(text);
                Ok(())
            }
            Pending::DefineBody(name) => Err(DtxError::parse(
                self.line,
                format!("Expected an array body for #define {name}, found '{text}'"),
            )),
        }
    }

    fn incomplete_directive(&self, found: char) -> DtxError {
        DtxError::parse(
            self.line,
            format!("{}: unexpected '{}'", constants::ERR_INCOMPLETE_DIRECTIVE, found),
        )
    }
}
