//! Core processing modules
//!
//! - `engine`: lexer, tokens and macro expansion
//! - `assembler`: meta-commands and document output
//! - `replace`: literal replacement rules
//! - `format`: two-pass source formatter

pub mod assembler;
pub mod engine;
pub mod format;
pub mod options;
pub mod replace;

pub use assembler::{transform_with_resolver, Assembler};
pub use format::format_document;
pub use options::{ExpansionConfig, FormatOptions, Options, RunMode};
