//! Error types for the spin engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid setting level: {0} (valid levels are 1, 2, 3, 5, 6)")]
    InvalidSetting(u8),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type EngineResult<T> = Result<T, EngineError>;
