//! Error types for the Concord compiler.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Errors that can occur while reading policy sources.
#[derive(Error, Debug)]
pub enum CompilerError {
    /// Failed to read a policy file.
    #[error("Failed to read policy file {path}: {source}")]
    FileReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration text.
    #[error("Parse error in {file} at line {line}, column {column}: {message}")]
    ParseError {
        /// File being parsed.
        file: String,
        /// Line number of the error (1-based).
        line: usize,
        /// Column of the error (1-based).
        column: usize,
        /// Error message.
        message: String,
    },

    /// Directory JSON text could not be parsed.
    #[error("Invalid policy JSON in {file}: {source}")]
    InvalidJson {
        /// File being parsed.
        file: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Directory JSON has no top-level policy array.
    #[error("Missing 'policies' array in {file}")]
    MissingPolicies {
        /// File missing the array.
        file: String,
    },

    /// Core library error.
    #[error(transparent)]
    CoreError(#[from] concord_core::Error),
}

impl CompilerError {
    /// Returns true if this error came from malformed configuration text.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = CompilerError::ParseError {
            file: "policies.tf".to_string(),
            line: 10,
            column: 4,
            message: "unexpected '}'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Parse error in policies.tf at line 10, column 4: unexpected '}'"
        );
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_missing_policies_display() {
        let err = CompilerError::MissingPolicies {
            file: "export.json".to_string(),
        };
        assert_eq!(err.to_string(), "Missing 'policies' array in export.json");
        assert!(!err.is_parse_error());
    }
}
