//! Common error types for tahfiz

use thiserror::Error;

/// Common result type for tahfiz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the tahfiz crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Verse pack loading or validation error
    #[error("Verse pack error: {0}")]
    VersePack(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
