//! First formatting pass: line breaking
//!
//! Walks the token stream once, re-wrapping text at a target width and
//! forcing breaks around environments, conditionals, definitions and row
//! separators. Output is collected as a list of chunks so that a break can
//! be inserted in front of something emitted earlier (the start of an
//! environment whose end turned out to be on another line).

use crate::core::engine::utils::count_newlines;
use crate::core::engine::{is_definition_keyword, Token, TokenKind};
use crate::utils::error::{XppError, XppResult};
use log::warn;

/// Output built from chunks that may still be edited
#[derive(Debug, Default)]
struct ChunkBuffer {
    chunks: Vec<String>,
}

impl ChunkBuffer {
    /// Append a chunk and return its index
    fn push(&mut self, s: &str) -> usize {
        self.chunks.push(s.to_string());
        self.chunks.len() - 1
    }

    /// Index the next pushed chunk will get
    fn next_index(&self) -> usize {
        self.chunks.len()
    }

    /// True if nothing precedes chunk `index` or the text before it ends a line
    fn starts_line(&self, index: usize) -> bool {
        self.chunks[..index.min(self.chunks.len())]
            .iter()
            .rev()
            .find(|c| !c.is_empty())
            .map_or(true, |c| c.ends_with('\n'))
    }

    fn break_before(&mut self, index: usize) {
        if !self.starts_line(index) {
            if let Some(chunk) = self.chunks.get_mut(index) {
                chunk.insert(0, '\n');
            }
        }
    }

    fn replace(&mut self, index: usize, s: &str) {
        if let Some(chunk) = self.chunks.get_mut(index) {
            *chunk = s.to_string();
        }
    }

    /// Characters emitted after chunk `index`
    fn chars_after(&self, index: usize) -> usize {
        self.chunks
            .iter()
            .skip(index + 1)
            .map(|c| c.chars().count())
            .sum()
    }

    fn is_empty(&self) -> bool {
        self.chunks.iter().all(|c| c.is_empty())
    }

    fn ends_with_newline(&self) -> bool {
        self.chunks
            .iter()
            .rev()
            .find(|c| !c.is_empty())
            .map_or(true, |c| c.ends_with('\n'))
    }

    fn into_string(self) -> String {
        self.chunks.concat()
    }
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    line: usize,
    chunk: usize,
}

#[derive(Debug, Clone, Copy)]
struct DefCheckpoint {
    line: usize,
    chunk: usize,
    open_braces: usize,
}

fn is_single_newline(token: &Token) -> bool {
    match &token.kind {
        TokenKind::Whitespace(ws) => count_newlines(ws) == 1,
        _ => false,
    }
}

fn is_rule_command(name: &str) -> bool {
    matches!(name, "\\hline" | "\\cline")
}

/// Line-breaking state
pub struct Reflow<'t> {
    tokens: &'t [Token],
    index: usize,
    width: usize,
    out: ChunkBuffer,
    column: usize,
    line: usize,
    has_space: bool,
    last_space: Option<usize>,
    end_arg_depth: usize,
    defs: Vec<DefCheckpoint>,
    conditionals: Vec<Checkpoint>,
    environments: Vec<Checkpoint>,
    discard: bool,
    after_command_or_group_end: bool,
    break_unless_text: bool,
}

impl<'t> Reflow<'t> {
    pub fn new(tokens: &'t [Token], width: usize) -> Self {
        Reflow {
            tokens,
            index: 0,
            width,
            out: ChunkBuffer::default(),
            column: 0,
            line: 0,
            has_space: false,
            last_space: None,
            end_arg_depth: 0,
            defs: Vec::new(),
            conditionals: Vec::new(),
            environments: Vec::new(),
            discard: true,
            after_command_or_group_end: false,
            break_unless_text: false,
        }
    }

    /// Run the pass and return the re-broken text
    pub fn run(mut self) -> XppResult<String> {
        let tokens = self.tokens;
        while self.index < tokens.len() {
            self.discard = true;
            let token = &tokens[self.index];

            if self.break_unless_text {
                self.break_unless_text = false;
                if !matches!(token.kind, TokenKind::Text(_)) {
                    self.newline();
                }
            }
            if !token.is_whitespace() {
                self.has_space = false;
            }

            match &token.kind {
                TokenKind::Text(text) => self.emit(text),
                TokenKind::MacroArg(_) => self.emit(&token.payload()),
                TokenKind::CommandSequence(name) | TokenKind::Macro(name) => self.command(name),
                TokenKind::LineComment(comment) => {
                    self.out.push(comment);
                    if comment.ends_with('\n') {
                        self.line += 1;
                        self.column = 0;
                        self.last_space = None;
                    }
                }
                TokenKind::Whitespace(ws) => self.whitespace(ws),
                TokenKind::GroupBegin => self.group_begin(),
                TokenKind::GroupEnd => self.group_end(),
                TokenKind::EndOfFile | TokenKind::Invalid => {
                    return Err(XppError::parse(
                        format!("unexpected {} in formatter input", token.token_type()),
                        &token.loc,
                    ))
                }
            }

            self.after_command_or_group_end = matches!(
                tokens.get(self.index).map(|t| &t.kind),
                Some(TokenKind::CommandSequence(_)) | Some(TokenKind::GroupEnd)
            );
            if self.discard {
                self.index += 1;
            }
        }

        self.wrap_overflow();
        if !self.out.ends_with_newline() {
            self.out.push("\n");
        }
        Ok(self.out.into_string())
    }

    /// Advance to the next token
    fn next(&mut self) -> Option<&'t Token> {
        self.index += 1;
        self.tokens.get(self.index)
    }

    fn emit(&mut self, s: &str) {
        self.out.push(s);
        self.column += s.chars().count();
    }

    fn newline(&mut self) {
        self.out.push("\n");
        self.column = 0;
        self.line += 1;
        self.last_space = None;
    }

    /// Turn the last space into a break if the current line is too long
    fn wrap_overflow(&mut self) {
        if self.column > self.width {
            if let Some(space) = self.last_space.take() {
                self.out.replace(space, "\n");
                self.column = self.out.chars_after(space);
            }
        }
    }

    fn space(&mut self) {
        if self.column != 0 {
            self.last_space = Some(self.out.push(" "));
            self.has_space = true;
            self.column += 1;
        }
    }

    /// Break after the current construct. A comment directly following it
    /// stays on the same line; a single newline in the input is absorbed.
    fn provide_newline(&mut self) {
        let mut token = match self.next() {
            Some(token) => token,
            None => return,
        };
        if let TokenKind::LineComment(comment) = &token.kind {
            self.out.push(comment.strip_suffix('\n').unwrap_or(comment));
            token = match self.next() {
                Some(token) => token,
                None => return,
            };
        }
        self.discard = is_single_newline(token);
        self.newline();
    }

    fn open_brace(&mut self) {
        if let Some(def) = self.defs.last_mut() {
            def.open_braces += 1;
        }
    }

    fn close_brace(&mut self) {
        if let Some(def) = self.defs.last_mut() {
            def.open_braces = def.open_braces.saturating_sub(1);
        }
    }

    fn command(&mut self, name: &str) {
        match name {
            "\\item" if self.column != 0 => self.newline(),
            "\\begin" => return self.begin_environment(),
            "\\end" => {
                if self.end_environment() {
                    return;
                }
            }
            "\\fi" => {
                match self.conditionals.pop() {
                    Some(cp) if cp.line != self.line => {
                        self.out.break_before(cp.chunk);
                        if self.column != 0 {
                            self.newline();
                        }
                    }
                    Some(_) => {}
                    None => warn!("\\fi without a matching \\if"),
                }
                return self.emit(name);
            }
            "\\[" => {
                if self.column != 0 {
                    self.newline();
                }
            }
            "\\]" => {
                self.emit(name);
                return self.provide_newline();
            }
            _ if is_definition_keyword(name) => self.defs.push(DefCheckpoint {
                line: self.line,
                chunk: self.out.next_index(),
                open_braces: 0,
            }),
            _ if name.starts_with("\\if") => self.conditionals.push(Checkpoint {
                line: self.line,
                chunk: self.out.next_index(),
            }),
            _ => {}
        }

        self.emit(name);
        if name.ends_with('\n') {
            self.line += 1;
            self.column = 0;
            self.last_space = None;
        }

        if name == "\\\\" || is_rule_command(name) {
            self.row_break(name);
        }
    }

    /// After `\\`, `\hline` or `\cline`: keep following rules on this line,
    /// then break
    fn row_break(&mut self, command: &str) {
        let mut takes_argument = command == "\\cline";
        let mut token = match self.next() {
            Some(token) => token,
            None => return,
        };
        loop {
            if takes_argument && token.is_group_begin() {
                token = match self.copy_group() {
                    Some(token) => token,
                    None => return,
                };
            }
            match token.as_command() {
                Some(name) if is_rule_command(name) => {
                    self.emit(name);
                    takes_argument = name == "\\cline";
                    token = match self.next() {
                        Some(token) => token,
                        None => return,
                    };
                }
                _ => break,
            }
        }
        self.discard = is_single_newline(token);
        self.newline();
    }

    /// Emit the group at the current token as is and return the token after it
    fn copy_group(&mut self) -> Option<&'t Token> {
        let mut depth = 0usize;
        let mut token = self.tokens.get(self.index)?;
        loop {
            match token.kind {
                TokenKind::GroupBegin => depth += 1,
                TokenKind::GroupEnd => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.emit(&token.payload());
            token = self.next()?;
            if depth == 0 {
                return Some(token);
            }
        }
    }

    fn begin_environment(&mut self) {
        self.environments.push(Checkpoint {
            line: self.line,
            chunk: self.out.next_index(),
        });
        self.emit("\\begin");

        match self.next() {
            Some(token) if token.is_group_begin() => {}
            Some(_) => {
                self.discard = false;
                return;
            }
            None => return,
        }
        self.emit("{");
        self.open_brace();

        match self.next() {
            Some(token) if token.as_text() == Some("document") => {}
            Some(_) => {
                self.discard = false;
                return;
            }
            None => return,
        }
        self.emit("document");

        match self.next() {
            Some(token) if token.is_group_end() => {}
            Some(_) => {
                self.discard = false;
                return;
            }
            None => return,
        }
        self.out.push("}");
        self.close_brace();
        self.newline();

        if let Some(token) = self.next() {
            self.discard = is_single_newline(token);
        }
    }

    /// Returns false when `\end` should be emitted inline
    fn end_environment(&mut self) -> bool {
        let cp = match self.environments.pop() {
            Some(cp) => cp,
            None => {
                warn!("\\end without a matching \\begin");
                return false;
            }
        };
        if cp.line == self.line {
            return false;
        }

        self.out.break_before(cp.chunk);
        if self.column != 0 {
            self.newline();
        }
        self.emit("\\end");
        if let Some(token) = self.next() {
            if token.is_group_begin() {
                self.emit("{");
                self.open_brace();
                self.end_arg_depth += 1;
                self.next();
            }
        }
        self.discard = false;
        true
    }

    fn whitespace(&mut self, ws: &str) {
        let newlines = count_newlines(ws);
        if newlines >= 2 && self.out.is_empty() {
            return;
        }
        if newlines >= 2 {
            if self.column > self.width {
                if let Some(space) = self.last_space.take() {
                    self.out.replace(space, "\n");
                }
            }
            self.out.push("\n");
            self.newline();
        } else if self.column > self.width {
            self.wrap_overflow();
            if self.column > self.width {
                self.newline();
            } else {
                if newlines == 1 {
                    self.break_unless_text = true;
                }
                self.space();
            }
        } else if self.after_command_or_group_end && newlines > 0 {
            self.newline();
        } else if !self.has_space && self.column != 0 {
            if newlines == 1 {
                self.break_unless_text = true;
            }
            self.space();
        }
    }

    fn group_begin(&mut self) {
        if self.end_arg_depth > 0 {
            self.end_arg_depth += 1;
        }

        let first_def_brace = match self.defs.last_mut() {
            Some(def) => {
                def.open_braces += 1;
                def.open_braces == 1
            }
            None => false,
        };
        self.emit("{");
        if !first_def_brace {
            return;
        }

        // Keep a break the author put right after the body's opening brace
        match self.next() {
            Some(Token {
                kind: TokenKind::Whitespace(ws),
                ..
            }) if count_newlines(ws) > 0 => {
                if count_newlines(ws) > 1 {
                    self.out.push("\n");
                }
                self.newline();
            }
            Some(_) => self.discard = false,
            None => {}
        }
    }

    fn group_end(&mut self) {
        if let Some(def) = self.defs.last_mut() {
            def.open_braces = def.open_braces.saturating_sub(1);
            if def.open_braces == 0 {
                let def = *def;
                self.defs.pop();
                if def.line != self.line {
                    self.out.break_before(def.chunk);
                    if self.column != 0 {
                        self.newline();
                    }
                    self.out.push("}");
                    return self.provide_newline();
                }
            }
        }

        self.emit("}");
        if self.end_arg_depth > 0 {
            self.end_arg_depth -= 1;
            if self.end_arg_depth == 0 {
                self.provide_newline();
            }
        }
    }
}

/// Re-break `tokens` at `width`
pub fn reflow(tokens: &[Token], width: usize) -> XppResult<String> {
    Reflow::new(tokens, width).run()
}
