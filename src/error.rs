//! Error types for typealign.

use thiserror::Error;

use crate::validate::ValidationIssue;

/// Result type for typealign operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for typealign operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or missing configuration (ontology, event catalog, settings).
    ///
    /// Always fatal: a bad configuration silently corrupts every score.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An annotation failed a fatal validation check.
    #[error("Validation failed at {location}: {issue}")]
    Validation {
        /// `file:line` of the offending entry
        location: String,
        /// What was wrong with it
        issue: ValidationIssue,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(location: impl Into<String>, issue: ValidationIssue) -> Self {
        Self::Validation {
            location: location.into(),
            issue,
        }
    }

    /// Whether this error belongs to the configuration class.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
