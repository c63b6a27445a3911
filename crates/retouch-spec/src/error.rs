//! Error types for retouch parameter validation and processing.

use thiserror::Error;

/// Error codes for retouch parameter validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Parameter errors (E001-E009)
    /// E001: F0 floor is not below the F0 ceiling
    InvertedF0Range,
    /// E002: F0 bound is not a positive finite frequency
    InvalidF0Bound,
    /// E003: Frame period is not a positive finite duration
    InvalidFramePeriod,
    /// E004: Retouch control is NaN or infinite
    NonFiniteControl,

    // Signal errors (E010-E019)
    /// E010: Sample buffer is empty
    EmptySignal,
    /// E011: Sample rate is zero
    InvalidSampleRate,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvertedF0Range => "E001",
            ErrorCode::InvalidF0Bound => "E002",
            ErrorCode::InvalidFramePeriod => "E003",
            ErrorCode::NonFiniteControl => "E004",
            ErrorCode::EmptySignal => "E010",
            ErrorCode::InvalidSampleRate => "E011",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for retouch parameter validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: F0 ceiling lies above the Nyquist frequency
    F0CeilAboveNyquist,
    /// W002: Breathiness outside [-100, 100] percent, clamped
    BreathinessClamped,
    /// W003: Pitch correction outside [0, 100] percent, clamped
    PitchCorrectionClamped,
    /// W004: F0 floor below the lowest detectable F0
    F0FloorBelowDetectable,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::F0CeilAboveNyquist => "W001",
            WarningCode::BreathinessClamped => "W002",
            WarningCode::PitchCorrectionClamped => "W003",
            WarningCode::F0FloorBelowDetectable => "W004",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Name of the parameter that failed (e.g., "f0_floor").
    pub field: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Creates a new validation error attributed to a parameter.
    pub fn with_field(
        code: ErrorCode,
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(ref field) => write!(f, "{}: {} (field {})", self.code, self.message, field),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Name of the parameter the warning refers to.
    pub field: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning attributed to a parameter.
    pub fn with_field(
        code: WarningCode,
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(ref field) => write!(f, "{}: {} (field {})", self.code, self.message, field),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Top-level error type for parameter loading.
#[derive(Debug, Error)]
pub enum SpecError {
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of validating a set of retouch parameters.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Validation errors; any entry makes the parameters unusable.
    pub errors: Vec<ValidationError>,
    /// Validation warnings; the parameters are usable but adjusted.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if an error with the given code was recorded.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

/// Common trait for backend errors.
///
/// Gives every backend error a stable code and a category so callers can
/// report failures without matching on backend-specific enums.
pub trait BackendError: std::error::Error {
    /// Stable error code, e.g. "RETOUCH_001".
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category used for grouping, e.g. "retouch".
    fn category(&self) -> &'static str;
}
