//! Lexer with a stack of input levels
//!
//! The bottom level is the main document. Included files push a new
//! character level; macro expansions push a level of ready-made tokens.
//! Reading always happens from the top, so an expansion is consumed before
//! anything that was pending underneath it.

use super::token::{NodeList, SourceLocation, Token, TokenKind};
use crate::utils::error::{XppError, XppResult};
use std::collections::VecDeque;
use std::rc::Rc;

/// Characters that end a run of text
fn is_special(c: char) -> bool {
    matches!(c, '%' | '\\' | '{' | '}' | '#') || is_whitespace(c)
}

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Letters that may form a multi-character control word
fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '@'
}

/// A file being read character by character
struct CharSource {
    chars: Vec<char>,
    pos: usize,
    file: Rc<str>,
    line: usize,
    column: usize,
}

impl CharSource {
    fn new(input: &str, file: &str) -> Self {
        CharSource {
            chars: input.chars().collect(),
            pos: 0,
            file: Rc::from(file),
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn here(&self) -> SourceLocation {
        SourceLocation {
            file: Rc::clone(&self.file),
            line: self.line,
            column: self.column,
        }
    }

    fn take_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
    }

    /// Lex one token; the caller has checked that input remains
    fn lex(&mut self) -> XppResult<Token> {
        let loc = self.here();
        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::EndOfFile, loc)),
        };

        let kind = match c {
            '%' => {
                let mut comment = String::from('%');
                self.take_while(&mut comment, |c| c != '\n');
                if let Some(nl) = self.bump() {
                    comment.push(nl);
                }
                TokenKind::LineComment(comment)
            }
            '\\' => {
                let first = self.bump().ok_or_else(|| {
                    XppError::lex("dangling '\\' at end of input", &loc)
                })?;
                let mut name = String::from('\\');
                name.push(first);
                if is_letter(first) {
                    self.take_while(&mut name, is_letter);
                }
                TokenKind::CommandSequence(name)
            }
            '{' => TokenKind::GroupBegin,
            '}' => TokenKind::GroupEnd,
            '#' => {
                let deferred = self.peek() == Some('#');
                if deferred {
                    self.bump();
                }
                match self.bump() {
                    Some(d @ '1'..='9') => {
                        let n = d as u8 - b'0';
                        TokenKind::MacroArg(if deferred { n + 10 } else { n })
                    }
                    _ => {
                        return Err(XppError::lex(
                            "malformed parameter: '#' must be followed by a digit 1-9",
                            &loc,
                        ))
                    }
                }
            }
            c if is_whitespace(c) => {
                let mut ws = String::from(c);
                self.take_while(&mut ws, is_whitespace);
                TokenKind::Whitespace(ws)
            }
            c => {
                let mut text = String::from(c);
                self.take_while(&mut text, |c| !is_special(c));
                TokenKind::Text(text)
            }
        };

        Ok(Token::new(kind, loc))
    }

    /// Read one `{...}` operand of `\Replace*` without tokenizing it.
    /// `\{`, `\}` and `\\` are escapes; any other backslash is kept.
    fn raw_operand(&mut self, command: &SourceLocation) -> XppResult<String> {
        while self.peek().map_or(false, is_whitespace) {
            self.bump();
        }
        if self.peek() != Some('{') {
            return Err(XppError::lex(
                "expected '{' after \\Replace* (syntax: \\Replace*{text}{replacement})",
                &self.here(),
            ));
        }
        self.bump();

        let mut operand = String::new();
        loop {
            match self.bump() {
                Some('}') => return Ok(operand),
                Some('\\') => match self.bump() {
                    Some(c @ ('{' | '}' | '\\')) => operand.push(c),
                    Some(c) => {
                        operand.push('\\');
                        operand.push(c);
                    }
                    None => break,
                },
                Some(c) => operand.push(c),
                None => break,
            }
        }
        Err(XppError::lex("unterminated \\Replace* operand", command))
    }
}

enum InputLevel {
    Source(CharSource),
    Pending(VecDeque<Token>),
}

/// Token reader over a stack of inputs
pub struct Lexer {
    levels: Vec<InputLevel>,
}

impl Lexer {
    /// Create a lexer reading `input`, reported as `file` in locations
    pub fn new(input: &str, file: &str) -> Self {
        Lexer {
            levels: vec![InputLevel::Source(CharSource::new(input, file))],
        }
    }

    /// Read the next token. At the end of the main input this keeps
    /// returning `EndOfFile`.
    pub fn next_token(&mut self) -> XppResult<Token> {
        loop {
            let depth = self.levels.len();
            match self.levels.last_mut() {
                Some(InputLevel::Pending(queue)) => {
                    if let Some(token) = queue.pop_front() {
                        return Ok(token);
                    }
                    self.levels.pop();
                }
                Some(InputLevel::Source(src)) => {
                    if src.peek().is_some() || depth == 1 {
                        return src.lex();
                    }
                    self.levels.pop();
                }
                None => return Ok(Token::new(TokenKind::EndOfFile, SourceLocation::default())),
            }
        }
    }

    /// Push tokens to be read before anything still pending
    pub fn push_tokens(&mut self, tokens: Vec<Token>) {
        if tokens.is_empty() {
            return;
        }
        self.drop_exhausted();
        self.levels.push(InputLevel::Pending(tokens.into()));
    }

    /// Start reading a new file on top of the current input
    pub fn push_source(&mut self, input: &str, file: &str) {
        self.levels.push(InputLevel::Source(CharSource::new(input, file)));
    }

    /// Number of files currently open, the main input included
    pub fn source_depth(&self) -> usize {
        self.levels
            .iter()
            .filter(|level| matches!(level, InputLevel::Source(_)))
            .count()
    }

    /// The next raw character, if the top of the stack is a file
    pub fn peek_char(&mut self) -> Option<char> {
        self.drop_exhausted();
        match self.levels.last() {
            Some(InputLevel::Source(src)) => src.peek(),
            _ => None,
        }
    }

    /// Read `*{text}{replacement}` directly from the characters following
    /// a `\Replace` command.
    pub fn read_raw_replace(&mut self, command: &SourceLocation) -> XppResult<(String, String)> {
        if self.peek_char() != Some('*') {
            return Err(XppError::lex(
                "raw replacement operands must follow \\Replace* directly in a file",
                command,
            ));
        }
        match self.levels.last_mut() {
            Some(InputLevel::Source(src)) => {
                src.bump();
                let pattern = src.raw_operand(command)?;
                let replacement = src.raw_operand(command)?;
                Ok((pattern, replacement))
            }
            _ => Err(XppError::lex("no raw input available", command)),
        }
    }

    /// Remove spent token levels (and spent included files) from the top
    fn drop_exhausted(&mut self) {
        while self.levels.len() > 1 {
            let spent = match self.levels.last() {
                Some(InputLevel::Pending(queue)) => queue.is_empty(),
                Some(InputLevel::Source(src)) => src.peek().is_none(),
                None => false,
            };
            if !spent {
                break;
            }
            self.levels.pop();
        }
    }
}

/// Tokenize a whole string. The trailing `EndOfFile` is not included.
pub fn tokenize(input: &str, file: &str) -> XppResult<NodeList> {
    let mut lexer = Lexer::new(input, file);
    let mut tokens = NodeList::new();
    loop {
        let token = lexer.next_token()?;
        if token.is_eof() {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

/// Convert tokens back to the text they were read from
pub fn detokenize(tokens: &NodeList) -> String {
    tokens.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input, "test.tex")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_control_words_and_symbols() {
        assert_eq!(
            kinds("\\foo\\,\\@x1"),
            vec![
                TokenKind::CommandSequence("\\foo".into()),
                TokenKind::CommandSequence("\\,".into()),
                TokenKind::CommandSequence("\\@x".into()),
                TokenKind::Text("1".into()),
            ]
        );
    }

    #[test]
    fn test_text_whitespace_and_groups() {
        assert_eq!(
            kinds("ab c\n{d}"),
            vec![
                TokenKind::Text("ab".into()),
                TokenKind::Whitespace(" ".into()),
                TokenKind::Text("c".into()),
                TokenKind::Whitespace("\n".into()),
                TokenKind::GroupBegin,
                TokenKind::Text("d".into()),
                TokenKind::GroupEnd,
            ]
        );
    }

    #[test]
    fn test_comment_keeps_newline() {
        assert_eq!(
            kinds("% note\nx"),
            vec![
                TokenKind::LineComment("% note\n".into()),
                TokenKind::Text("x".into()),
            ]
        );
    }

    #[test]
    fn test_parameter_markers() {
        assert_eq!(
            kinds("#1##2"),
            vec![TokenKind::MacroArg(1), TokenKind::MacroArg(12)]
        );
        assert!(tokenize("#a", "t").is_err());
        assert!(tokenize("#", "t").is_err());
    }

    #[test]
    fn test_dangling_backslash() {
        let err = tokenize("abc\\", "t").unwrap_err();
        assert!(matches!(err, XppError::Lex { .. }));
    }

    #[test]
    fn test_escaped_newline_is_control_symbol() {
        assert_eq!(
            kinds("\\\n"),
            vec![TokenKind::CommandSequence("\\\n".into())]
        );
    }

    #[test]
    fn test_locations() {
        let tokens = tokenize("a\n  \\b", "doc.tex").unwrap().into_inner();
        assert_eq!(tokens[2].loc, SourceLocation::new("doc.tex", 2, 3));
    }

    #[test]
    fn test_roundtrip() {
        let input = "\\section{Intro} text % c\n#1 {x}";
        assert_eq!(detokenize(&tokenize(input, "t").unwrap()), input);
    }

    #[test]
    fn test_pushed_tokens_come_first() {
        let mut lexer = Lexer::new("b", "t");
        lexer.push_tokens(vec![Token::text("a", SourceLocation::default())]);
        assert_eq!(lexer.next_token().unwrap().as_text(), Some("a"));
        assert_eq!(lexer.next_token().unwrap().as_text(), Some("b"));
        assert!(lexer.next_token().unwrap().is_eof());
        assert!(lexer.next_token().unwrap().is_eof());
    }

    #[test]
    fn test_included_source() {
        let mut lexer = Lexer::new("x", "main.tex");
        lexer.push_source("inc", "inc.tex");
        assert_eq!(lexer.source_depth(), 2);
        let first = lexer.next_token().unwrap();
        assert_eq!(first.as_text(), Some("inc"));
        assert_eq!(&*first.loc.file, "inc.tex");
        assert_eq!(lexer.next_token().unwrap().as_text(), Some("x"));
    }

    #[test]
    fn test_raw_replace_operands() {
        let mut lexer = Lexer::new("*{a\\}b} {\\x\\\\}rest", "t");
        let loc = SourceLocation::default();
        let (pattern, replacement) = lexer.read_raw_replace(&loc).unwrap();
        assert_eq!(pattern, "a}b");
        assert_eq!(replacement, "\\x\\");
        assert_eq!(lexer.next_token().unwrap().as_text(), Some("rest"));
    }

    #[test]
    fn test_raw_replace_unterminated() {
        let mut lexer = Lexer::new("*{abc", "t");
        assert!(lexer.read_raw_replace(&SourceLocation::default()).is_err());
        let mut lexer = Lexer::new("*abc", "t");
        assert!(lexer.read_raw_replace(&SourceLocation::default()).is_err());
    }
}
