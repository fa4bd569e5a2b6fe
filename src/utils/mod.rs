//! Supporting utilities: errors and file access

pub mod error;
pub mod files;

pub use error::{XppError, XppResult};
pub use files::{FileResolveError, FileResolver, MemoryFileResolver, NoopFileResolver, StdFileResolver};
