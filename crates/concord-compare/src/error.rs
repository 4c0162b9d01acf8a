//! Error types for policy comparison.

use thiserror::Error;

/// Result type alias for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;

/// Errors that can occur while comparing policies.
#[derive(Error, Debug)]
pub enum CompareError {
    /// Matching options are inconsistent.
    #[error("Invalid matching options: {message}")]
    InvalidOptions {
        /// What is wrong with the options.
        message: String,
    },

    /// A matched pair could not be compared.
    #[error("Comparison failed for '{policy}': {message}")]
    Comparison {
        /// Label of the source policy.
        policy: String,
        /// Error message.
        message: String,
    },

    /// Policy source could not be loaded.
    #[error(transparent)]
    CompilerError(#[from] concord_compiler::CompilerError),

    /// Core library error.
    #[error(transparent)]
    CoreError(#[from] concord_core::Error),
}

impl CompareError {
    /// Creates an invalid-options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }
}
