//! Macro table and expansion
//!
//! Expansion reads the arguments of an invocation from the lexer,
//! substitutes them into the macro body and pushes the result back onto
//! the lexer, where it is read again (and expanded further) before any
//! input that was still pending.

use super::lexer::Lexer;
use super::primitives::Macro;
use super::token::{arg_index, NodeList, SourceLocation, Token, TokenKind};
use super::utils::merge_text;
use crate::core::options::ExpansionConfig;
use crate::utils::error::{XppError, XppResult};
use fxhash::FxHashMap;
use log::{debug, trace};
use std::collections::VecDeque;

/// Macros currently in scope, keyed by control sequence (with backslash)
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: FxHashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a macro
    pub fn define(&mut self, name: String, mac: Macro) {
        debug!("define {} ({} parameter(s))", name, mac.num_args());
        self.macros.insert(name, mac);
    }

    /// Remove a macro. Returns false if it was not defined.
    pub fn undefine(&mut self, name: &str) -> bool {
        let removed = self.macros.remove(name).is_some();
        debug!("undef {}{}", name, if removed { "" } else { " (not defined)" });
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Render nodes as literal text, expanding known macros inline.
    ///
    /// Unknown control sequences, braces and whitespace are kept as
    /// written; comments are dropped.
    pub fn flatten(&self, nodes: &NodeList, max_depth: usize) -> XppResult<String> {
        let mut out = String::new();
        self.flatten_into(nodes, 0, max_depth, &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        nodes: &NodeList,
        depth: usize,
        max_depth: usize,
        out: &mut String,
    ) -> XppResult<()> {
        for node in nodes {
            match &node.kind {
                TokenKind::CommandSequence(name) | TokenKind::Macro(name) => {
                    match self.macros.get(name) {
                        Some(mac) => {
                            if depth >= max_depth {
                                return Err(XppError::expansion(
                                    format!(
                                        "macro nesting deeper than {} while flattening {}",
                                        max_depth, name
                                    ),
                                    &node.loc,
                                ));
                            }
                            self.flatten_into(&mac.body, depth + 1, max_depth, out)?;
                        }
                        None => out.push_str(name),
                    }
                }
                TokenKind::LineComment(_) => {}
                TokenKind::MacroArg(_) => {
                    return Err(XppError::serialization(
                        format!("cannot use parameter {} as literal text", node.payload()),
                        &node.loc,
                    ))
                }
                TokenKind::EndOfFile | TokenKind::Invalid => {
                    return Err(XppError::serialization(
                        format!("cannot use {} as literal text", node.token_type()),
                        &node.loc,
                    ))
                }
                _ => out.push_str(&node.payload()),
            }
        }
        Ok(())
    }
}

/// Expands macro invocations, enforcing the expansion limit
#[derive(Debug)]
pub struct Expander {
    expansions: usize,
    max_expansions: usize,
}

impl Expander {
    pub fn new(config: &ExpansionConfig) -> Self {
        Expander {
            expansions: 0,
            max_expansions: config.max_expansions,
        }
    }

    /// Number of expansions performed so far
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Expand `mac`, invoked by `invocation`: capture its arguments from
    /// the lexer and push the substituted body back.
    pub fn expand(&mut self, lexer: &mut Lexer, invocation: &Token, mac: &Macro) -> XppResult<()> {
        self.expansions += 1;
        if self.expansions > self.max_expansions {
            return Err(XppError::expansion(
                format!(
                    "more than {} macro expansions (runaway recursion in {}?)",
                    self.max_expansions,
                    invocation.payload()
                ),
                &invocation.loc,
            ));
        }

        let args = capture_arguments(lexer, invocation, mac)?;
        trace!(
            "expand {} at {} with {} argument(s)",
            invocation.payload(),
            invocation.loc,
            args.len()
        );
        let expansion = substitute(invocation, mac, &args)?;
        lexer.push_tokens(expansion);
        Ok(())
    }
}

/// Read the arguments of `mac` following its invocation
fn capture_arguments(lexer: &mut Lexer, invocation: &Token, mac: &Macro) -> XppResult<Vec<NodeList>> {
    let mut reader = ArgumentReader::new(lexer, &invocation.loc);
    let args = read_arguments(&mut reader, invocation, mac);
    reader.finish();
    args
}

fn read_arguments(
    reader: &mut ArgumentReader<'_>,
    invocation: &Token,
    mac: &Macro,
) -> XppResult<Vec<NodeList>> {
    let mut args = Vec::with_capacity(mac.num_args());
    for (i, delimiter) in mac.delimiters.iter().enumerate() {
        if delimiter.is_empty() {
            reader.skip_whitespace()?;
            args.push(reader.undelimited(invocation)?);
        } else {
            if i == 0 {
                reader.skip_whitespace()?;
            }
            args.push(reader.delimited(delimiter, invocation)?);
        }
    }
    Ok(args)
}

/// Replace parameter markers in the body with the captured arguments
fn substitute(invocation: &Token, mac: &Macro, args: &[NodeList]) -> XppResult<Vec<Token>> {
    let mut out = Vec::with_capacity(mac.body.len());
    for token in &mac.body {
        match token.kind {
            TokenKind::MacroArg(n) => {
                let arg = args.get(arg_index(n)).ok_or_else(|| {
                    XppError::expansion(
                        format!(
                            "{} refers to parameter {} but takes {} argument(s)",
                            invocation.payload(),
                            token.payload(),
                            args.len()
                        ),
                        &invocation.loc,
                    )
                })?;
                out.extend(arg.iter().cloned());
            }
            _ => out.push(token.clone()),
        }
    }
    Ok(out)
}

/// Reads argument tokens one unit at a time.
///
/// Text tokens are split into single characters so a delimiter can end in
/// the middle of a word; whatever is left of a split token is handed back
/// to the lexer when the reader is finished.
struct ArgumentReader<'l> {
    lexer: &'l mut Lexer,
    pending: VecDeque<Token>,
    invocation: SourceLocation,
}

impl<'l> ArgumentReader<'l> {
    fn new(lexer: &'l mut Lexer, invocation: &SourceLocation) -> Self {
        ArgumentReader {
            lexer,
            pending: VecDeque::new(),
            invocation: invocation.clone(),
        }
    }

    fn next_raw(&mut self) -> XppResult<Token> {
        let token = match self.pending.pop_front() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        if token.is_eof() {
            return Err(XppError::expansion(
                "EOF while parsing macro arguments",
                &self.invocation,
            ));
        }
        Ok(token)
    }

    /// Next token, with multi-character text split off one character at a time
    fn next_unit(&mut self) -> XppResult<Token> {
        let token = self.next_raw()?;
        let text = match &token.kind {
            TokenKind::Text(text) if text.chars().count() > 1 => text.clone(),
            _ => String::new(),
        };
        if text.is_empty() {
            return Ok(token);
        }
        let mut units = text.chars().enumerate().map(|(i, c)| {
            let mut loc = token.loc.clone();
            loc.column += i;
            Token::text(c.to_string(), loc)
        });
        let first = units.next();
        let remaining: Vec<Token> = units.collect();
        for unit in remaining.into_iter().rev() {
            self.pending.push_front(unit);
        }
        Ok(first.unwrap_or(token))
    }

    fn skip_whitespace(&mut self) -> XppResult<()> {
        loop {
            let token = self.next_raw()?;
            if !token.is_whitespace() {
                self.pending.push_front(token);
                return Ok(());
            }
        }
    }

    /// A braced group's content, or else a single token
    fn undelimited(&mut self, invocation: &Token) -> XppResult<NodeList> {
        let first = if self.pending.is_empty() {
            self.next_raw()?
        } else {
            let pending: Vec<Token> = self.pending.drain(..).collect();
            let mut merged = merge_text(pending).into_iter();
            let first = merged.next();
            self.pending.extend(merged);
            match first {
                Some(token) => token,
                None => self.next_raw()?,
            }
        };

        match first.kind {
            TokenKind::GroupBegin => {
                let mut arg = Vec::new();
                let mut depth = 0usize;
                loop {
                    let token = self.next_raw()?;
                    match token.kind {
                        TokenKind::GroupBegin => depth += 1,
                        TokenKind::GroupEnd if depth == 0 => break,
                        TokenKind::GroupEnd => depth -= 1,
                        _ => {}
                    }
                    arg.push(token);
                }
                Ok(NodeList::from_vec(merge_text(arg)))
            }
            TokenKind::GroupEnd => Err(XppError::expansion(
                format!("argument of {} has an extra '}}'", invocation.payload()),
                &first.loc,
            )),
            _ => Ok(NodeList::from_vec(vec![first])),
        }
    }

    /// Everything up to the first occurrence of `delimiter` outside braces
    fn delimited(&mut self, delimiter: &NodeList, invocation: &Token) -> XppResult<NodeList> {
        let pattern = explode(delimiter);
        let mut arg: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.next_unit()?;
            match token.kind {
                TokenKind::GroupBegin => depth += 1,
                TokenKind::GroupEnd if depth == 0 => {
                    return Err(XppError::expansion(
                        format!("argument of {} has an extra '}}'", invocation.payload()),
                        &token.loc,
                    ))
                }
                TokenKind::GroupEnd => depth -= 1,
                _ => {}
            }
            arg.push(token);
            if depth == 0 && arg.ends_with(&pattern) {
                arg.truncate(arg.len() - pattern.len());
                break;
            }
        }
        strip_outer_group(&mut arg);
        Ok(NodeList::from_vec(merge_text(arg)))
    }

    /// Hand unconsumed tokens back to the lexer
    fn finish(self) {
        let pending: Vec<Token> = self.pending.into_iter().collect();
        self.lexer.push_tokens(merge_text(pending));
    }
}

/// Split text tokens of a delimiter into single characters
fn explode(delimiter: &NodeList) -> Vec<Token> {
    let mut out = Vec::new();
    for token in delimiter {
        match &token.kind {
            TokenKind::Text(text) => {
                out.extend(text.chars().map(|c| Token::text(c.to_string(), token.loc.clone())))
            }
            _ => out.push(token.clone()),
        }
    }
    out
}

/// `{abc}` becomes `abc` when the braces enclose the whole argument
fn strip_outer_group(arg: &mut Vec<Token>) {
    if arg.len() < 2 || !arg[0].is_group_begin() || !arg[arg.len() - 1].is_group_end() {
        return;
    }
    let mut depth = 0usize;
    for (i, token) in arg.iter().enumerate() {
        match token.kind {
            TokenKind::GroupBegin => depth += 1,
            TokenKind::GroupEnd => {
                depth -= 1;
                if depth == 0 && i != arg.len() - 1 {
                    return;
                }
            }
            _ => {}
        }
    }
    arg.pop();
    arg.remove(0);
}
