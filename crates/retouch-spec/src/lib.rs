//! Retouch Parameter Library
//!
//! This crate provides the types shared by the voice retouch pipeline:
//! parameters, validation, and run reports.
//!
//! # Overview
//!
//! A retouch request is a [`RetouchParams`] value describing how a mono voice
//! recording is analysed (F0 range, frame period, estimator) and how it is
//! reshaped before resynthesis (pitch shift, formant shift, breathiness,
//! pitch correction). Parameters are plain serde types and can be loaded from
//! JSON.
//!
//! # Example
//!
//! ```
//! use retouch_spec::{validate_params, F0Estimator, RetouchParams};
//!
//! let params = RetouchParams::builder()
//!     .estimator(F0Estimator::Precise)
//!     .pitch_shift(12.0)
//!     .formant_shift(-2.0)
//!     .breathiness(30.0)
//!     .build();
//!
//! let result = validate_params(&params, 16_000, 16_000);
//! assert!(result.is_ok());
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error and warning types
//! - [`params`]: Retouch parameters and builder
//! - [`report`]: Run report and stage timings
//! - [`validation`]: Parameter validation

pub mod error;
pub mod params;
pub mod report;
pub mod validation;

pub use error::{
    BackendError, ErrorCode, SpecError, ValidationError, ValidationResult, ValidationWarning,
    WarningCode,
};
pub use params::{
    semitones_to_rate, F0Estimator, RetouchParams, RetouchParamsBuilder, BREATHINESS_WIDTH,
    DEFAULT_F0_CEIL, DEFAULT_F0_FLOOR, DEFAULT_FRAME_PERIOD_MS, MIN_DETECTABLE_F0,
};
pub use report::{RetouchReport, StageTiming};
pub use validation::validate_params;
