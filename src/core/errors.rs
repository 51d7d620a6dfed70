//! Shared error types for the application

use thiserror::Error;

/// Main error type for callmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (bad flags, empty file set, unusable config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No program block was found anywhere in the corpus
    #[error("No entry point found: {0}")]
    UnresolvedEntryPoint(String),

    /// A construction-time guarantee was observed to be broken
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
