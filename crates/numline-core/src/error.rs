//! Error types for Numline core.

use thiserror::Error;

/// Errors from reading or writing documents. Calculation failures never
/// surface here: they are recorded on the line that caused them.
#[derive(Error, Debug)]
pub enum NumlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Refusing to read {path}: file too large ({size} bytes, max {max})")]
    TooLarge { path: String, size: u64, max: u64 },
}

pub type Result<T> = std::result::Result<T, NumlineError>;
