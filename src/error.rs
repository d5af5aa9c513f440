//! Error taxonomy for the codec.
//!
//! `CodecError` covers the few conditions that stop a run before any output
//! is produced. Everything else is an `Issue`: recorded, reported, and never
//! allowed to abort the remaining files.

use std::path::PathBuf;

use serde::Serialize;

/// Fatal conditions, surfaced to the caller before any output exists
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("root directory does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("document is empty (no pages or no text)")]
    EmptyDocument,

    #[error("document could not be read: {path}")]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("invalid exclusion pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Non-fatal problems accumulated over a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A path became unreadable during traversal; entry skipped
    Enumeration { path: Option<PathBuf>, message: String },

    /// No supported text encoding could decode the file; placeholder emitted
    Encoding { path: PathBuf },

    /// The file could not be read at all; error text emitted instead
    Read { path: PathBuf, message: String },

    /// The destination file could not be created or written
    Write { path: PathBuf, message: String },
}

impl Issue {
    /// Path the issue refers to, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Issue::Enumeration { path, .. } => path.as_ref(),
            Issue::Encoding { path } | Issue::Read { path, .. } | Issue::Write { path, .. } => {
                Some(path)
            }
        }
    }

    pub fn is_encoding(&self) -> bool {
        matches!(self, Issue::Encoding { .. })
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::Enumeration { path: Some(p), message } => {
                write!(f, "enumeration error at {}: {}", p.display(), message)
            }
            Issue::Enumeration { path: None, message } => {
                write!(f, "enumeration error: {}", message)
            }
            Issue::Encoding { path } => {
                write!(f, "unsupported encoding: {}", path.display())
            }
            Issue::Read { path, message } => {
                write!(f, "read error {}: {}", path.display(), message)
            }
            Issue::Write { path, message } => {
                write!(f, "write error {}: {}", path.display(), message)
            }
        }
    }
}
