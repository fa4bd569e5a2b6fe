//! File access for `\Include`
//!
//! The assembler never touches the filesystem directly; it asks a
//! `FileResolver`. The binary uses `StdFileResolver`, tests use
//! `MemoryFileResolver`.

use fxhash::FxHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for resolving and reading included files
pub trait FileResolver {
    /// Read a file's contents
    fn read_file(&self, path: &str) -> Result<String, FileResolveError>;
}

/// Error type for file resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileResolveError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("read error: {0}")]
    ReadError(String),
    #[error("includes are not supported here: {0}")]
    NotSupported(String),
}

/// Filesystem resolver with a list of search directories
#[derive(Debug, Clone, Default)]
pub struct StdFileResolver {
    search_paths: Vec<PathBuf>,
}

impl StdFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that looks next to `base_dir` first
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            search_paths: vec![base_dir.as_ref().to_path_buf()],
        }
    }

    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    /// Try the name as given, then with `.tex`, then in each search path
    fn find_file(&self, filename: &str) -> Option<PathBuf> {
        let with_ext = format!("{}.tex", filename);
        let path = Path::new(filename);
        if path.is_absolute() {
            return [path.to_path_buf(), PathBuf::from(&with_ext)]
                .into_iter()
                .find(|p| p.is_file());
        }

        for dir in &self.search_paths {
            for candidate in [dir.join(filename), dir.join(&with_ext)] {
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        [path.to_path_buf(), PathBuf::from(&with_ext)]
            .into_iter()
            .find(|p| p.is_file())
    }
}

impl FileResolver for StdFileResolver {
    fn read_file(&self, path: &str) -> Result<String, FileResolveError> {
        let full_path = self
            .find_file(path)
            .ok_or_else(|| FileResolveError::NotFound(path.to_string()))?;
        std::fs::read_to_string(&full_path)
            .map_err(|e| FileResolveError::ReadError(format!("{}: {}", full_path.display(), e)))
    }
}

/// In-memory files, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryFileResolver {
    files: FxHashMap<String, String>,
}

impl MemoryFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the in-memory storage
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }
}

impl FileResolver for MemoryFileResolver {
    fn read_file(&self, path: &str) -> Result<String, FileResolveError> {
        self.files
            .get(path)
            .or_else(|| self.files.get(&format!("{}.tex", path)))
            .cloned()
            .ok_or_else(|| FileResolveError::NotFound(path.to_string()))
    }
}

/// Resolver that refuses every include
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileResolver;

impl FileResolver for NoopFileResolver {
    fn read_file(&self, path: &str) -> Result<String, FileResolveError> {
        Err(FileResolveError::NotSupported(path.to_string()))
    }
}
