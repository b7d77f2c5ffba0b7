//! Error types for the I/O edges (storage and configuration).
//!
//! The simulation itself never fails; these only surface from loading and
//! saving, and callers log them and fall back to defaults.

use std::io;

/// Failure reading or writing a key-value store
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Browser storage rejected the request (wasm32 only)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure loading a tuning file
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
}
