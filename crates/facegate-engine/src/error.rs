//! Error types for the access engine.
//!
//! Authentication failures are not errors: they are
//! [`SessionOutcome`](crate::SessionOutcome) values. These errors cover
//! device, store and console failures, plus configuration mistakes caught at
//! startup.

use facegate_hardware::HardwareError;
use facegate_storage::StorageError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A peripheral failed.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// The credential store or access log failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A domain value was rejected.
    #[error(transparent)]
    Core(#[from] facegate_core::Error),

    /// The operator console failed.
    #[error("Console error: {0}")]
    Console(String),

    /// The operator input reached end of file.
    #[error("Operator input closed")]
    InputClosed,

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn console(message: impl Into<String>) -> Self {
        Self::Console(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Hardware(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Console(err.to_string())
    }
}
