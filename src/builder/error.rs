//! Build errors for engine and state builders.

use crate::engine::EngineError;
use thiserror::Error;

/// Errors that can occur when building engines and states.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Stack capacity must be at least 1")]
    ZeroStackCapacity,

    #[error("State name must not be empty")]
    MissingStateName,

    #[error("Failed to register state: {0}")]
    Registration(#[from] EngineError),
}
