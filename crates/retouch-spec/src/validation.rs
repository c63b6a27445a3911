//! Retouch parameter validation.
//!
//! Validation runs before any analysis work so that malformed requests are
//! rejected without touching the signal.

use crate::error::{
    ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::params::{RetouchParams, MIN_DETECTABLE_F0};

/// Validates retouch parameters against a signal of the given shape.
///
/// # Arguments
/// * `params` - Parameters to validate
/// * `sample_rate` - Sample rate of the signal in Hz
/// * `sample_count` - Number of samples in the signal
///
/// # Returns
/// A [`ValidationResult`] with every error and warning found.
///
/// # Example
/// ```
/// use retouch_spec::{validate_params, ErrorCode, RetouchParams};
///
/// let params = RetouchParams::builder().f0_range(500.0, 100.0).build();
/// let result = validate_params(&params, 16_000, 16_000);
/// assert!(result.has_error(ErrorCode::InvertedF0Range));
/// ```
pub fn validate_params(
    params: &RetouchParams,
    sample_rate: u32,
    sample_count: usize,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    if sample_count == 0 {
        result.add_error(ValidationError::with_field(
            ErrorCode::EmptySignal,
            "sample buffer must not be empty",
            "samples",
        ));
    }

    if sample_rate == 0 {
        result.add_error(ValidationError::with_field(
            ErrorCode::InvalidSampleRate,
            "sample rate must be positive",
            "sample_rate",
        ));
    }

    if !(params.frame_period_ms.is_finite() && params.frame_period_ms > 0.0) {
        result.add_error(ValidationError::with_field(
            ErrorCode::InvalidFramePeriod,
            format!(
                "frame period must be a positive number of milliseconds, got {}",
                params.frame_period_ms
            ),
            "frame_period_ms",
        ));
    }

    let floor_ok = check_f0_bound(&mut result, "f0_floor", params.f0_floor);
    let ceil_ok = check_f0_bound(&mut result, "f0_ceil", params.f0_ceil);
    if floor_ok && ceil_ok && params.f0_floor >= params.f0_ceil {
        result.add_error(ValidationError::with_field(
            ErrorCode::InvertedF0Range,
            format!(
                "f0_floor ({} Hz) must be below f0_ceil ({} Hz)",
                params.f0_floor, params.f0_ceil
            ),
            "f0_floor",
        ));
    }

    for (field, value) in [
        ("pitch_shift_semitones", params.pitch_shift_semitones),
        ("formant_shift_semitones", params.formant_shift_semitones),
        ("breathiness_percent", params.breathiness_percent),
        ("pitch_correction_percent", params.pitch_correction_percent),
    ] {
        if !value.is_finite() {
            result.add_error(ValidationError::with_field(
                ErrorCode::NonFiniteControl,
                format!("{} must be finite, got {}", field, value),
                field,
            ));
        }
    }

    let nyquist = sample_rate as f64 / 2.0;
    if sample_rate > 0 && ceil_ok && params.f0_ceil > nyquist {
        result.add_warning(ValidationWarning::with_field(
            WarningCode::F0CeilAboveNyquist,
            format!(
                "f0_ceil ({} Hz) is above the Nyquist frequency ({} Hz)",
                params.f0_ceil, nyquist
            ),
            "f0_ceil",
        ));
    }

    if floor_ok && params.f0_floor < MIN_DETECTABLE_F0 {
        result.add_warning(ValidationWarning::with_field(
            WarningCode::F0FloorBelowDetectable,
            format!(
                "f0_floor ({} Hz) is below {} Hz; the pitch search stops at {} Hz",
                params.f0_floor, MIN_DETECTABLE_F0, MIN_DETECTABLE_F0
            ),
            "f0_floor",
        ));
    }

    if params.breathiness_percent.is_finite() && params.breathiness_percent.abs() > 100.0 {
        result.add_warning(ValidationWarning::with_field(
            WarningCode::BreathinessClamped,
            format!(
                "breathiness {}% is outside [-100, 100] and will be clamped",
                params.breathiness_percent
            ),
            "breathiness_percent",
        ));
    }

    if params.pitch_correction_percent.is_finite()
        && !(0.0..=100.0).contains(&params.pitch_correction_percent)
    {
        result.add_warning(ValidationWarning::with_field(
            WarningCode::PitchCorrectionClamped,
            format!(
                "pitch correction {}% is outside [0, 100] and will be clamped",
                params.pitch_correction_percent
            ),
            "pitch_correction_percent",
        ));
    }

    result
}

fn check_f0_bound(result: &mut ValidationResult, field: &str, value: f64) -> bool {
    if value.is_finite() && value > 0.0 {
        return true;
    }
    result.add_error(ValidationError::with_field(
        ErrorCode::InvalidF0Bound,
        format!("{} must be a positive frequency in Hz, got {}", field, value),
        field,
    ));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let result = validate_params(&RetouchParams::default(), 16_000, 16_000);
        assert!(result.is_ok());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_inverted_range() {
        let params = RetouchParams::builder().f0_range(500.0, 100.0).build();
        let result = validate_params(&params, 16_000, 16_000);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::InvertedF0Range);
        assert_eq!(result.errors[0].field.as_deref(), Some("f0_floor"));
    }

    #[test]
    fn test_equal_bounds_rejected() {
        let params = RetouchParams::builder().f0_range(200.0, 200.0).build();
        let result = validate_params(&params, 16_000, 16_000);
        assert!(result.has_error(ErrorCode::InvertedF0Range));
    }

    #[test]
    fn test_non_positive_bound_rejected() {
        let params = RetouchParams::builder().f0_range(0.0, 200.0).build();
        let result = validate_params(&params, 16_000, 16_000);
        assert!(result.has_error(ErrorCode::InvalidF0Bound));
        assert!(!result.has_error(ErrorCode::InvertedF0Range));
    }

    #[test]
    fn test_frame_period_rejected() {
        for period in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let params = RetouchParams::builder().frame_period_ms(period).build();
            let result = validate_params(&params, 16_000, 16_000);
            assert!(result.has_error(ErrorCode::InvalidFramePeriod), "{}", period);
        }
    }

    #[test]
    fn test_empty_signal_and_zero_rate() {
        let result = validate_params(&RetouchParams::default(), 0, 0);
        assert!(result.has_error(ErrorCode::EmptySignal));
        assert!(result.has_error(ErrorCode::InvalidSampleRate));
    }

    #[test]
    fn test_non_finite_controls() {
        let params = RetouchParams::builder()
            .pitch_shift(f64::NAN)
            .formant_shift(f64::NEG_INFINITY)
            .build();
        let result = validate_params(&params, 16_000, 16_000);
        let fields: Vec<_> = result
            .errors
            .iter()
            .filter_map(|e| e.field.as_deref())
            .collect();
        assert_eq!(fields, vec!["pitch_shift_semitones", "formant_shift_semitones"]);
    }

    #[test]
    fn test_warnings() {
        let params = RetouchParams::builder()
            .f0_range(71.0, 5000.0)
            .breathiness(150.0)
            .pitch_correction(120.0)
            .build();
        let result = validate_params(&params, 8_000, 8_000);
        assert!(result.is_ok());
        let codes: Vec<_> = result.warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![
                WarningCode::F0CeilAboveNyquist,
                WarningCode::BreathinessClamped,
                WarningCode::PitchCorrectionClamped,
            ]
        );
    }

    #[test]
    fn test_low_floor_warns() {
        let params = RetouchParams::builder().f0_range(2.0, 800.0).build();
        let result = validate_params(&params, 16_000, 16_000);
        assert!(result.is_ok());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::F0FloorBelowDetectable);
        assert_eq!(result.warnings[0].code.code(), "W004");

        let params = RetouchParams::builder().f0_range(40.0, 800.0).build();
        assert!(validate_params(&params, 16_000, 16_000).warnings.is_empty());
    }
}
