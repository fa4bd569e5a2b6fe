//! Token definitions shared by the lexer, the expander and the formatter.
//!
//! A document is a flat stream of tokens. Each token carries its kind
//! together with its payload and the position it was read from, so errors
//! raised long after lexing can still point at the source.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// Position of a token in its source file (1-based line and column)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize, column: usize) -> Self {
        SourceLocation {
            file: Rc::from(file),
            line,
            column,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation::new("<input>", 1, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The bare category of a token, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    Invalid,
    Text,
    Whitespace,
    CommandSequence,
    Macro,
    MacroArg,
    LineComment,
    GroupBegin,
    GroupEnd,
    EndOfFile,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Invalid => "invalid token",
            TokenType::Text => "text",
            TokenType::Whitespace => "whitespace",
            TokenType::CommandSequence => "command sequence",
            TokenType::Macro => "macro",
            TokenType::MacroArg => "macro parameter",
            TokenType::LineComment => "comment",
            TokenType::GroupBegin => "'{'",
            TokenType::GroupEnd => "'}'",
            TokenType::EndOfFile => "end of input",
        };
        f.write_str(name)
    }
}

/// A token kind together with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum TokenKind {
    Invalid,

    /// A maximal run of ordinary characters
    Text(String),

    /// A run of space, tab, newline, CR, VT or FF characters
    Whitespace(String),

    /// A control sequence such as `\foo` or `\,`.
    /// The string includes the leading backslash.
    CommandSequence(String),

    /// A resolved macro reference
    Macro(String),

    /// A parameter marker. `#n` is stored as `n` (1-9), `##n` as `n + 10`.
    MacroArg(u8),

    /// `%` up to and including the end-of-line character
    LineComment(String),

    GroupBegin,
    GroupEnd,
    EndOfFile,
}

impl TokenKind {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Invalid => TokenType::Invalid,
            TokenKind::Text(_) => TokenType::Text,
            TokenKind::Whitespace(_) => TokenType::Whitespace,
            TokenKind::CommandSequence(_) => TokenType::CommandSequence,
            TokenKind::Macro(_) => TokenType::Macro,
            TokenKind::MacroArg(_) => TokenType::MacroArg,
            TokenKind::LineComment(_) => TokenType::LineComment,
            TokenKind::GroupBegin => TokenType::GroupBegin,
            TokenKind::GroupEnd => TokenType::GroupEnd,
            TokenKind::EndOfFile => TokenType::EndOfFile,
        }
    }
}

/// Index (0-based) of the argument a parameter marker refers to
pub fn arg_index(marker: u8) -> usize {
    ((marker % 10) as usize).saturating_sub(1)
}

/// A single lexical unit of the input
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLocation,
}

/// Equality ignores the location: two tokens are equal when their
/// type and payload match.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Token {}

impl Token {
    pub fn new(kind: TokenKind, loc: SourceLocation) -> Self {
        Token { kind, loc }
    }

    pub fn text(text: impl Into<String>, loc: SourceLocation) -> Self {
        Token::new(TokenKind::Text(text.into()), loc)
    }

    pub fn token_type(&self) -> TokenType {
        self.kind.token_type()
    }

    /// The characters this token stands for in the output
    pub fn payload(&self) -> Cow<'_, str> {
        match &self.kind {
            TokenKind::Text(s)
            | TokenKind::Whitespace(s)
            | TokenKind::CommandSequence(s)
            | TokenKind::Macro(s)
            | TokenKind::LineComment(s) => Cow::Borrowed(s.as_str()),
            TokenKind::MacroArg(n) if *n >= 10 => Cow::Owned(format!("##{}", n - 10)),
            TokenKind::MacroArg(n) => Cow::Owned(format!("#{}", n)),
            TokenKind::GroupBegin => Cow::Borrowed("{"),
            TokenKind::GroupEnd => Cow::Borrowed("}"),
            TokenKind::Invalid | TokenKind::EndOfFile => Cow::Borrowed(""),
        }
    }

    /// Name of a control sequence, including the backslash
    pub fn as_command(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::CommandSequence(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace(_))
    }

    pub fn is_group_begin(&self) -> bool {
        matches!(self.kind, TokenKind::GroupBegin)
    }

    pub fn is_group_end(&self) -> bool {
        matches!(self.kind, TokenKind::GroupEnd)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::EndOfFile)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload())
    }
}

/// An ordered sequence of tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeList(Vec<Token>);

impl NodeList {
    pub fn new() -> Self {
        NodeList(Vec::new())
    }

    pub fn from_vec(tokens: Vec<Token>) -> Self {
        NodeList(tokens)
    }

    pub fn push(&mut self, token: Token) {
        self.0.push(token);
    }

    pub fn into_inner(self) -> Vec<Token> {
        self.0
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl IntoIterator for NodeList {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Token> for NodeList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        NodeList(iter.into_iter().collect())
    }
}
