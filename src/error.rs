//! Error types for pdftk-forms

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdftk-forms
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pdftk-forms
#[derive(Error, Debug)]
pub enum Error {
    /// Source PDF missing or not readable
    #[error("Cannot read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pdftk could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// pdftk reported an error on stderr or exited unsuccessfully
    #[error("pdftk error: {message}")]
    Tool { message: String },

    /// The XFDF document was written with zero bytes
    #[error("Interchange document {} was written empty", .path.display())]
    EmptyInterchange { path: PathBuf },

    /// XFDF generation error
    #[error("XFDF generation error: {0}")]
    Xfdf(#[from] quick_xml::Error),

    /// Temporary file error
    #[error("Temporary file error: {0}")]
    TempFile(#[source] std::io::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileAccess,
    Spawn,
    Tool,
    Serialization,
    TempResource,
    Io,
}

impl Error {
    /// Build a [`Error::Tool`] from raw stderr bytes.
    pub fn tool(stderr: &[u8]) -> Self {
        Error::Tool {
            message: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileAccess { .. } => ErrorKind::FileAccess,
            Error::Spawn { .. } => ErrorKind::Spawn,
            Error::Tool { .. } => ErrorKind::Tool,
            Error::EmptyInterchange { .. } | Error::Xfdf(_) | Error::Serialization(_) => {
                ErrorKind::Serialization
            }
            Error::TempFile(_) => ErrorKind::TempResource,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
