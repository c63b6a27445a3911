//! Error types for the retouch backend.

use retouch_spec::{BackendError, ValidationError};
use thiserror::Error;

/// Result type for retouch operations.
pub type RetouchResult<T> = Result<T, RetouchError>;

/// Errors that can occur while retouching a signal.
#[derive(Debug, Error)]
pub enum RetouchError {
    /// Invalid parameter value or buffer shape.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// An analysis or synthesis stage could not produce its output.
    #[error("{stage} failed: {message}")]
    EstimationFailure {
        /// Pipeline stage that failed.
        stage: &'static str,
        /// Error message.
        message: String,
    },

    /// A frame buffer could not be allocated.
    #[error("cannot allocate a {frames}x{bins} frame buffer")]
    AllocationFailure {
        /// Requested row count.
        frames: usize,
        /// Requested column count.
        bins: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV decoding or encoding error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl RetouchError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an estimation failure for the given stage.
    pub fn estimation(stage: &'static str, message: impl Into<String>) -> Self {
        Self::EstimationFailure {
            stage,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for RetouchError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidParameter {
            name: err.field.unwrap_or_else(|| "params".to_string()),
            message: format!("{} ({})", err.message, err.code),
        }
    }
}

impl BackendError for RetouchError {
    fn code(&self) -> &'static str {
        match self {
            RetouchError::InvalidParameter { .. } => "RETOUCH_001",
            RetouchError::EstimationFailure { .. } => "RETOUCH_002",
            RetouchError::AllocationFailure { .. } => "RETOUCH_003",
            RetouchError::Io(_) => "RETOUCH_004",
            RetouchError::Wav(_) => "RETOUCH_005",
        }
    }

    fn category(&self) -> &'static str {
        "retouch"
    }
}
