//! Run-time options

use serde::{Deserialize, Serialize};

/// Default maximum number of macro expansions in one document
pub const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

/// Default maximum nesting of `\Include`
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// Default maximum macro nesting when flattening literal groups
pub const DEFAULT_MAX_FLATTEN_DEPTH: usize = 200;

/// Default target line width for the formatter
pub const DEFAULT_LINE_WIDTH: usize = 100;

/// What to do with the input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Expand macros and apply replacement rules
    #[default]
    Transform,
    /// Reflow and indent
    Format,
}

/// Formatter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Lines are broken at whitespace once they grow past this width
    pub line_width: usize,
    /// Environments whose `\item`s get a hanging indent
    pub list_environments: Vec<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            line_width: DEFAULT_LINE_WIDTH,
            list_environments: vec!["enumerate".to_string(), "itemize".to_string()],
        }
    }
}

impl FormatOptions {
    /// 80 columns, default list environments
    pub fn compact() -> Self {
        FormatOptions {
            line_width: 80,
            ..Default::default()
        }
    }

    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Treat another environment as a list
    pub fn with_list_environment(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.list_environments.contains(&name) {
            self.list_environments.push(name);
        }
        self
    }

    pub fn is_list_environment(&self, name: &str) -> bool {
        self.list_environments.iter().any(|env| env == name)
    }
}

/// Limits guarding against runaway expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub max_expansions: usize,
    pub max_include_depth: usize,
    pub max_flatten_depth: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        ExpansionConfig {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_flatten_depth: DEFAULT_MAX_FLATTEN_DEPTH,
        }
    }
}

/// Everything a run needs besides the input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub mode: RunMode,
    pub format: FormatOptions,
    pub expansion: ExpansionConfig,
}
