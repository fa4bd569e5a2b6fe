//! Error types for xpp
//!
//! Every failure carries the location of the offending token when one is
//! known, so the binary can print `file:line:col: ...` diagnostics.

use crate::core::engine::SourceLocation;
use thiserror::Error;

/// Errors that can occur while tokenizing, expanding or emitting a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XppError {
    /// Malformed character input (dangling `\`, bad `#` marker, raw operands)
    #[error("{}lex error: {message}", located(.location))]
    Lex {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Structural problems: unbalanced groups, malformed definitions
    #[error("{}parse error: {message}", located(.location))]
    Parse {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Argument capture or substitution failed, or a limit was exceeded
    #[error("{}expansion error: {message}", located(.location))]
    Expansion {
        message: String,
        location: Option<SourceLocation>,
    },

    /// A node could not be written as text
    #[error("{}serialization error: {message}", located(.location))]
    Serialization {
        message: String,
        location: Option<SourceLocation>,
    },

    /// An `\Include` target could not be loaded
    #[error("{}cannot include '{path}': {reason}", located(.location))]
    Include {
        path: String,
        reason: String,
        location: Option<SourceLocation>,
    },

    /// Reading input or writing output failed
    #[error("I/O error: {message}")]
    Io { message: String },
}

fn located(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!("{}: ", loc),
        None => String::new(),
    }
}

/// Result type alias for xpp operations
pub type XppResult<T> = Result<T, XppError>;

impl XppError {
    /// Create a lex error at a location
    pub fn lex(message: impl Into<String>, location: &SourceLocation) -> Self {
        XppError::Lex {
            message: message.into(),
            location: Some(location.clone()),
        }
    }

    /// Create a parse error at a location
    pub fn parse(message: impl Into<String>, location: &SourceLocation) -> Self {
        XppError::Parse {
            message: message.into(),
            location: Some(location.clone()),
        }
    }

    /// Create an expansion error at a location
    pub fn expansion(message: impl Into<String>, location: &SourceLocation) -> Self {
        XppError::Expansion {
            message: message.into(),
            location: Some(location.clone()),
        }
    }

    /// Create a serialization error at a location
    pub fn serialization(message: impl Into<String>, location: &SourceLocation) -> Self {
        XppError::Serialization {
            message: message.into(),
            location: Some(location.clone()),
        }
    }

    /// Create an include error for `path`
    pub fn include(
        path: impl Into<String>,
        reason: impl ToString,
        location: &SourceLocation,
    ) -> Self {
        XppError::Include {
            path: path.into(),
            reason: reason.to_string(),
            location: Some(location.clone()),
        }
    }

    /// Where the error happened, if known
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            XppError::Lex { location, .. }
            | XppError::Parse { location, .. }
            | XppError::Expansion { location, .. }
            | XppError::Serialization { location, .. }
            | XppError::Include { location, .. } => location.as_ref(),
            XppError::Io { .. } => None,
        }
    }
}

impl From<std::io::Error> for XppError {
    fn from(err: std::io::Error) -> Self {
        XppError::Io {
            message: err.to_string(),
        }
    }
}
