//! Simulation error types

use hb_engine::EngineError;
use thiserror::Error;

/// Errors from batch runs and sweeps
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Spin count must be positive, got {0}")]
    InvalidSpinCount(u64),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
