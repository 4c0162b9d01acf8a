//! Error types for Concord core operations.
//!
//! This module defines the error types used throughout the `concord-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Concord core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A policy state string did not name a known state.
    #[error("Unrecognized policy state: '{value}'")]
    UnknownState {
        /// The raw state value.
        value: String,
    },

    /// A source format string did not name a known format.
    #[error("Unrecognized source format: '{value}'")]
    UnknownFormat {
        /// The raw format value.
        value: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
