//! # xpp
//!
//! Macro preprocessor and source formatter for TeX-like markup.
//!
//! ## Features
//!
//! - **Delimited macros**: `\Define\name#1,#2.{body}` with TeX-style
//!   parameter text, expanded recursively
//! - **Replacement rules**: `\Replace{text}{replacement}` on text runs and
//!   `\Replace*{text}{replacement}` on the final output
//! - **Includes**: `\Include{file}` through a pluggable [`FileResolver`]
//! - **Formatter**: reflows text to a line width and indents environments,
//!   lists, conditionals and definition bodies
//!
//! ## Usage Examples
//!
//! ### Macro expansion
//!
//! ```rust
//! use xpp::transform_document;
//!
//! let out = transform_document(r"\Define\Greet#1,{Hello, #1!}\Greet World,").unwrap();
//! assert_eq!(out, "Hello, World!");
//! ```
//!
//! ### Formatting
//!
//! ```rust
//! use xpp::{format_document, FormatOptions};
//!
//! let out = format_document("\\begin{center}\nx\n\\end{center}\n", &FormatOptions::default()).unwrap();
//! assert_eq!(out, "\\begin{center}\n    x\n\\end{center}\n");
//! ```

/// Core processing modules
pub mod core;

/// Errors and file access
pub mod utils;

use std::io::Write;

pub use crate::core::engine::{detokenize, NodeList, SourceLocation, Token, TokenKind, TokenType};
pub use crate::core::{
    format_document, transform_with_resolver, Assembler, ExpansionConfig, FormatOptions, Options,
    RunMode,
};
pub use crate::utils::error::{XppError, XppResult};
pub use crate::utils::files::{
    FileResolveError, FileResolver, MemoryFileResolver, NoopFileResolver, StdFileResolver,
};

/// Tokenize `input`, reporting locations against `file`
pub fn tokenize(input: &str, file: &str) -> XppResult<NodeList> {
    crate::core::engine::tokenize(input, file)
}

/// Expand a document that does not include other files
pub fn transform_document(input: &str) -> XppResult<String> {
    transform_with_resolver(input, "<input>", &NoopFileResolver, &ExpansionConfig::default())
}

/// Process `input` according to `options` and write the result to `sink`
pub fn run(
    input: &str,
    file: &str,
    options: &Options,
    resolver: &dyn FileResolver,
    sink: &mut dyn Write,
) -> XppResult<()> {
    let output = match options.mode {
        RunMode::Transform => transform_with_resolver(input, file, resolver, &options.expansion)?,
        RunMode::Format => format_document(input, &options.format)?,
    };
    sink.write_all(output.as_bytes())?;
    sink.flush()?;
    Ok(())
}
