//! Error types for TextFusion.
//!
//! Every stage of the search pipeline reports failures through [`AppError`].
//! The stage-specific variants (`Retrieval`, `Completion`, `Prompt`) stay
//! distinguishable inside the workspace; the pipeline coordinator collapses
//! them into the single `Search` category before they reach a caller.

use thiserror::Error;

/// Unified error type for TextFusion.
///
/// All functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Search service failures (transport, credential, malformed response)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Completion service failures (transport, credential, limits, malformed response)
    #[error("Completion error: {0}")]
    Completion(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Uniform failure reported by the pipeline coordinator
    #[error("Search failed: {0}")]
    Search(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Collapse any error into the coordinator's single reportable category.
    ///
    /// The detail carries the original error's description. Errors that are
    /// already `Search` are passed through unchanged.
    pub fn into_search_failure(self) -> Self {
        match self {
            AppError::Search(detail) => AppError::Search(detail),
            other => AppError::Search(other.to_string()),
        }
    }

    /// The detail text of a `Search` failure, or the full message otherwise.
    pub fn detail(&self) -> String {
        match self {
            AppError::Search(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
