//! Error types for tahfiz-session
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the tahfiz-session crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Verse pack loading or lookup errors
    #[error("Verse pack error: {0}")]
    VersePack(String),

    /// Speech recognition backend errors
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// Reference audio playback errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Session engine errors
    #[error("Session error: {0}")]
    Session(String),

    /// Session report serialization or writing errors
    #[error("Report error: {0}")]
    Report(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Shared error from tahfiz-common
    #[error(transparent)]
    Common(#[from] tahfiz_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using tahfiz-session Error
pub type Result<T> = std::result::Result<T, Error>;
