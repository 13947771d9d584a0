//! Error types for sigsift.
//!
//! Analysis has one fatal condition caused by its input: the file cannot be
//! opened as a regular file. Everything else an input can do wrong ends up in
//! the report's `suspicious`/`reasons` fields instead of here. Out-of-range
//! settings are rejected before any file is touched.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Path does not exist, is not a regular file, or could not be read
    #[error("file not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: Option<io::Error>,
    },

    /// Configuration file could not be read or parsed
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A setting given on the command line, in a request or through a builder
    #[error("invalid setting: {0}")]
    Setting(String),

    /// Report output and other I/O outside of analysis
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn not_found(path: &Path) -> Self {
        Error::NotFound {
            path: path.to_path_buf(),
            source: None,
        }
    }

    pub(crate) fn unreadable(path: &Path, source: io::Error) -> Self {
        Error::NotFound {
            path: path.to_path_buf(),
            source: Some(source),
        }
    }

    /// True for the fatal "cannot open input" kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
