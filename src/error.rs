//! Error types for hashit
//!
//! Every failure the engine can surface is one variant of [`HashitError`].
//! Per-file failures (access, mapping, accumulator) are recoverable and only
//! abandon the affected source; stream read failures are fatal to the run.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hashit operations
#[derive(Error, Debug)]
pub enum HashitError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path the operation was on
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Source could not be opened or stat-ed
    #[error("Unable to access '{path}': {source}")]
    SourceAccess {
        /// Source path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Source could not be memory mapped
    #[error("Unable to map '{path}': {source}")]
    Mapping {
        /// Source path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Read failure while streaming a source; aborts the whole run
    #[error("Read error while streaming '{source_id}': {source}")]
    StreamRead {
        /// Source path, or `stdin`
        source_id: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A digest consumption task died or disagreed on the byte count
    #[error("Digest accumulator failed for '{source_id}': {message}")]
    Accumulator {
        /// Source path, or `stdin`
        source_id: String,
        /// What went wrong
        message: String,
    },

    /// Hash algorithm not supported
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Output rendering error
    #[error("Output error: {0}")]
    OutputError(String),
}

/// Coarse classification of a failure, used by the per-file state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open/stat failure
    SourceAccess,
    /// Mapping setup failure
    Mapping,
    /// Stream read failure
    StreamRead,
    /// Accumulator task failure
    Accumulator,
    /// Anything else
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceAccess => "source-access",
            Self::Mapping => "mapping",
            Self::StreamRead => "stream-read",
            Self::Accumulator => "accumulator",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl HashitError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a source-access (open/stat) error
    pub fn source_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceAccess {
            path: path.into(),
            source,
        }
    }

    /// Create a mapping error
    pub fn mapping(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Mapping {
            path: path.into(),
            source,
        }
    }

    /// Create a stream read error
    pub fn stream_read(source_id: impl Into<String>, source: std::io::Error) -> Self {
        Self::StreamRead {
            source_id: source_id.into(),
            source,
        }
    }

    /// Create an accumulator error
    pub fn accumulator(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Accumulator {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Whether this error must terminate the entire run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StreamRead { .. })
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceAccess { .. } => ErrorKind::SourceAccess,
            Self::Mapping { .. } => ErrorKind::Mapping,
            Self::StreamRead { .. } => ErrorKind::StreamRead,
            Self::Accumulator { .. } => ErrorKind::Accumulator,
            _ => ErrorKind::Other,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::SourceAccess { path, .. } | Self::Mapping { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Result type alias for hashit operations
pub type Result<T> = std::result::Result<T, HashitError>;

impl From<std::io::Error> for HashitError {
    fn from(err: std::io::Error) -> Self {
        HashitError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for HashitError {
    fn from(err: serde_json::Error) -> Self {
        HashitError::OutputError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| HashitError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = HashitError::io("/test/path", io_err);
        assert!(err.path().is_some());
        assert_eq!(err.path().unwrap(), &PathBuf::from("/test/path"));
    }

    #[test]
    fn test_only_stream_read_is_fatal() {
        let io = || std::io::Error::new(std::io::ErrorKind::Other, "boom");

        assert!(HashitError::stream_read("stdin", io()).is_fatal());
        assert!(!HashitError::source_access("/a", io()).is_fatal());
        assert!(!HashitError::mapping("/a", io()).is_fatal());
        assert!(!HashitError::accumulator("/a", "died").is_fatal());
    }

    #[test]
    fn test_error_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = HashitError::source_access("/secret", io);
        assert_eq!(err.kind(), ErrorKind::SourceAccess);
        assert_eq!(err.kind().to_string(), "source-access");
        assert_eq!(HashitError::config("bad").kind(), ErrorKind::Other);
    }
}
