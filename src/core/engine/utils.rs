//! Helpers for reading groups and operands from the raw token stream

use super::lexer::Lexer;
use super::token::{NodeList, Token, TokenKind};
use crate::utils::error::{XppError, XppResult};

/// Read tokens until one is neither whitespace nor a comment
pub fn next_significant(lexer: &mut Lexer) -> XppResult<Token> {
    loop {
        let token = lexer.next_token()?;
        if !matches!(
            token.kind,
            TokenKind::Whitespace(_) | TokenKind::LineComment(_)
        ) {
            return Ok(token);
        }
    }
}

/// Read the body of a group whose `{` has already been consumed.
///
/// Braces inside are kept. Comments are dropped, along with whitespace
/// directly following a comment. Reaching the end of input is an error
/// reported at `open`.
pub fn read_group(lexer: &mut Lexer, open: &Token) -> XppResult<NodeList> {
    let mut body = NodeList::new();
    let mut depth = 0usize;
    let mut after_comment = false;
    loop {
        let token = lexer.next_token()?;
        let was_after_comment = std::mem::replace(&mut after_comment, false);
        match token.kind {
            TokenKind::EndOfFile => {
                return Err(XppError::parse("group terminated by end of input", &open.loc))
            }
            TokenKind::GroupBegin => depth += 1,
            TokenKind::GroupEnd if depth == 0 => return Ok(body),
            TokenKind::GroupEnd => depth -= 1,
            TokenKind::LineComment(_) => {
                after_comment = true;
                continue;
            }
            TokenKind::Whitespace(_) if was_after_comment => continue,
            _ => {}
        }
        body.push(token);
    }
}

/// Read a `{...}` operand of `command`, skipping blanks before the brace
pub fn read_operand(lexer: &mut Lexer, command: &Token) -> XppResult<NodeList> {
    let open = next_significant(lexer)?;
    if !open.is_group_begin() {
        return Err(XppError::parse(
            format!(
                "expected '{{' after {}, found {}",
                command.payload(),
                open.token_type()
            ),
            &open.loc,
        ));
    }
    read_group(lexer, &open)
}

/// Number of line breaks in a whitespace run, capped at two
pub fn count_newlines(ws: &str) -> usize {
    ws.chars().filter(|&c| c == '\n').take(2).count()
}

/// Join runs of adjacent text tokens into one token
pub fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (Some(last), TokenKind::Text(next)) = (merged.last_mut(), &token.kind) {
            if let TokenKind::Text(prev) = &mut last.kind {
                prev.push_str(next);
                continue;
            }
        }
        merged.push(token);
    }
    merged
}
