//! Source formatter
//!
//! Two passes over the tokenized document: [`reflow`] decides where lines
//! break, [`indent`] decides how far each line is indented.

pub mod indent;
pub mod reflow;

use crate::core::engine::tokenize;
use crate::core::options::FormatOptions;
use crate::utils::error::XppResult;

pub use indent::indent;
pub use reflow::reflow;

/// Reformat a document. Every output line ends with a newline.
pub fn format_document(input: &str, options: &FormatOptions) -> XppResult<String> {
    let tokens = tokenize(input, "<input>")?;
    let broken = reflow(tokens.as_slice(), options.line_width)?;
    let mut out = String::with_capacity(broken.len());
    for line in indent(&broken, options) {
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
