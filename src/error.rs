//! Error types for the editor engine

use thiserror::Error;

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the editor engine.
///
/// Recoverable conditions (template compile failures, parameter parse
/// failures, remote render failures) never surface here; they go through
/// the [`crate::diagnostics::Diagnostics`] channel instead and the
/// pipeline keeps running. This enum is reserved for failures a caller
/// must act on.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to construct the pipeline or one of its workers
    #[error("Editor initialization failed: {0}")]
    InitializationError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Publish was attempted without an API key
    #[error("No API key provided")]
    MissingApiKey,

    /// The publish endpoint rejected the template or returned garbage
    #[error("Publish failed: {0}")]
    PublishError(String),

    /// Durable storage could not be read or written
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
