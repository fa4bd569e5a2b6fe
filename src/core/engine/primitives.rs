//! Built-in commands
//!
//! This module handles the meta-commands the assembler reacts to:
//! - `\Define\name<parameter text>{body}`
//! - `\Undef\name`
//! - `\Replace{text}{replacement}` and `\Replace*{text}{replacement}`
//! - `\Include{file}`

use super::lexer::Lexer;
use super::token::{NodeList, Token, TokenKind};
use super::utils;
use crate::utils::error::{XppError, XppResult};
use phf::{phf_map, phf_set};

/// Commands handled by the assembler instead of being emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Define,
    Undef,
    Replace,
    Include,
}

static META_COMMANDS: phf::Map<&'static str, MetaCommand> = phf_map! {
    "\\Define" => MetaCommand::Define,
    "\\Undef" => MetaCommand::Undef,
    "\\Replace" => MetaCommand::Replace,
    "\\Include" => MetaCommand::Include,
};

/// Commands that open a definition body, for layout purposes
static DEFINITION_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "\\def",
    "\\Define",
    "\\Defun",
    "\\Eval",
};

/// Look up a control sequence among the meta-commands
pub fn meta_command(name: &str) -> Option<MetaCommand> {
    META_COMMANDS.get(name).copied()
}

/// Check if a control sequence starts a definition
pub fn is_definition_keyword(name: &str) -> bool {
    DEFINITION_KEYWORDS.contains(name)
}

/// A user-defined macro.
///
/// `delimiters[i]` is the literal token sequence that ends argument `i`;
/// an empty sequence means the argument is undelimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Macro {
    pub delimiters: Vec<NodeList>,
    pub body: NodeList,
}

impl Macro {
    pub fn num_args(&self) -> usize {
        self.delimiters.len()
    }
}

/// Parse the rest of a `\Define`: name, parameter text and body.
/// The body is stored unexpanded.
pub fn parse_definition(lexer: &mut Lexer, command: &Token) -> XppResult<(String, Macro)> {
    let name = read_macro_name(lexer, command)?;

    let mut delimiters: Vec<NodeList> = Vec::new();
    let mut token = lexer.next_token()?;
    if matches!(token.kind, TokenKind::MacroArg(_)) {
        loop {
            match &token.kind {
                TokenKind::GroupBegin => break,
                TokenKind::MacroArg(n) => {
                    let expected = delimiters.len() + 1;
                    if *n as usize != expected {
                        return Err(XppError::parse(
                            format!(
                                "parameters of {} must be numbered consecutively: expected #{}, found {}",
                                name,
                                expected,
                                token.payload()
                            ),
                            &token.loc,
                        ));
                    }
                    delimiters.push(NodeList::new());
                }
                TokenKind::Text(_) | TokenKind::Whitespace(_) | TokenKind::CommandSequence(_) => {
                    if let Some(delimiter) = delimiters.last_mut() {
                        delimiter.push(token.clone());
                    }
                }
                _ => {
                    return Err(XppError::parse(
                        format!(
                            "unexpected {} in parameter text of {}",
                            token.token_type(),
                            name
                        ),
                        &token.loc,
                    ))
                }
            }
            token = lexer.next_token()?;
        }
    } else if matches!(token.kind, TokenKind::Whitespace(_) | TokenKind::LineComment(_)) {
        token = utils::next_significant(lexer)?;
    }

    if !token.is_group_begin() {
        return Err(XppError::parse(
            format!(
                "expected '{{' to start the body of {}, found {}",
                name,
                token.token_type()
            ),
            &token.loc,
        ));
    }

    let body = utils::read_group(lexer, &token)?;
    Ok((name, Macro { delimiters, body }))
}

/// Parse the name following `\Undef`
pub fn parse_undef(lexer: &mut Lexer, command: &Token) -> XppResult<String> {
    read_macro_name(lexer, command)
}

fn read_macro_name(lexer: &mut Lexer, command: &Token) -> XppResult<String> {
    let token = utils::next_significant(lexer)?;
    match token.kind {
        TokenKind::CommandSequence(name) => Ok(name),
        other => Err(XppError::parse(
            format!(
                "expected a command sequence after {}, found {}",
                command.payload(),
                other.token_type()
            ),
            &token.loc,
        )),
    }
}
