//! Error types for OrdoDB
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using OrdoError
pub type Result<T> = std::result::Result<T, OrdoError>;

/// Unified error type for OrdoDB operations
#[derive(Debug, Error)]
pub enum OrdoError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// The underlying ordered store failed or returned corrupt data.
    /// Never recovered locally.
    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Cursor Errors
    // -------------------------------------------------------------------------
    /// A value accessor was called on a cursor that is not positioned on
    /// a matching entry.
    #[error("Cursor is not valid")]
    InvalidCursorState,

    #[error("Index {index} is over array size: {size}")]
    OutOfRange { index: usize, size: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for OrdoError {
    fn from(e: bincode::Error) -> Self {
        OrdoError::Serialization(e.to_string())
    }
}
