//! Storage error types.

use std::io;
use thiserror::Error;

/// Storage error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Backing file exists but is not a JSON object of strings.
    #[error("corrupt store {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Store refuses writes (quota, permissions, private mode).
    #[error("store is read-only")]
    ReadOnly,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create a Corrupt error.
    pub fn corrupt(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Storage result type.
pub type StoreResult<T> = Result<T, StoreError>;
