//! Token engine
//!
//! ```text
//! source text ──► Lexer (stack of files and pushed-back tokens)
//!                   │
//!                   ▼
//!              Expander ──► captured arguments ──► substituted body
//!                   │                                   │
//!                   └──────────── pushed back ◄─────────┘
//! ```
//!
//! The lexer produces [`Token`]s. User macros live in a [`MacroTable`]
//! and are expanded by an [`Expander`], which pushes every expansion back
//! onto the lexer so it is re-read before the rest of the input.

pub mod lexer;
pub mod macros;
pub mod primitives;
pub mod token;
pub mod utils;

pub use lexer::{detokenize, tokenize, Lexer};
pub use macros::{Expander, MacroTable};
pub use primitives::{is_definition_keyword, meta_command, Macro, MetaCommand};
pub use token::{NodeList, SourceLocation, Token, TokenKind, TokenType};
