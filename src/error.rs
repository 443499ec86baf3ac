//! Error types for the I/O surfaces
//!
//! Gameplay never fails; only loading and storing data does.

use thiserror::Error;

/// Errors raised while loading definitions or persisting progress
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid level definition: {0}")]
    InvalidLevel(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
