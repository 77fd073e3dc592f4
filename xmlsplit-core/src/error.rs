//! Error types for splitting runs
//!
//! Every variant is fatal to the current run. Each one carries the file or
//! setting that caused it so the caller can report it without extra context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while configuring or running a split
#[derive(Error, Debug)]
pub enum SplitError {
    /// No candidate input file in the input location
    #[error("no input file matching '{pattern}' found in {}", dir.display())]
    MissingInput {
        /// Directory that was searched
        dir: PathBuf,
        /// File pattern applied inside the directory
        pattern: String,
    },

    /// The streaming parser rejected the source document
    #[error("malformed XML in {source_name} at byte {position}: {message}")]
    MalformedSource {
        /// Path (or reader label) of the offending document
        source_name: String,
        /// Byte offset reported by the parser
        position: u64,
        /// Parser message
        message: String,
    },

    /// Opening, writing, closing or renaming a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Required settings are missing or invalid
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A downstream transform or export step failed
    #[error("{stage} failed for {}: {message}", path.display())]
    Collaborator {
        /// Pipeline stage name
        stage: &'static str,
        /// File the stage was working on
        path: PathBuf,
        /// Failure description
        message: String,
    },
}

impl SplitError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SplitError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for split operations
pub type Result<T> = std::result::Result<T, SplitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_input_display() {
        let err = SplitError::MissingInput {
            dir: PathBuf::from("data/input"),
            pattern: "*.xml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no input file matching '*.xml' found in data/input"
        );
    }

    #[test]
    fn test_malformed_display_has_position() {
        let err = SplitError::MalformedSource {
            source_name: "big.xml".to_string(),
            position: 42,
            message: "unexpected end of document".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("big.xml"));
        assert!(msg.contains("byte 42"));
    }

    #[test]
    fn test_io_keeps_source() {
        let err = SplitError::io(
            "out/chunk_1.xml",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("out/chunk_1.xml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
