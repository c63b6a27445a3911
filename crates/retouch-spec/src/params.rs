//! Retouch parameter types.

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Default analysis frame period in milliseconds.
pub const DEFAULT_FRAME_PERIOD_MS: f64 = 5.0;

/// Default lower F0 search bound in Hz.
pub const DEFAULT_F0_FLOOR: f64 = 71.0;

/// Default upper F0 search bound in Hz.
pub const DEFAULT_F0_CEIL: f64 = 800.0;

/// Lowest F0 the pitch detector searches for, in Hz. Lower floors are
/// accepted but the search stops here.
pub const MIN_DETECTABLE_F0: f64 = 40.0;

/// Frequency width applied by the breathiness retouch.
pub const BREATHINESS_WIDTH: f64 = 0.8;

/// F0 estimator used for the first analysis stage.
///
/// Both variants produce the same `(time markers, f0)` pair; they differ in
/// speed and robustness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum F0Estimator {
    /// Fast, approximate estimator.
    #[default]
    Fast,
    /// Slower estimator with contour post-processing.
    Precise,
}

impl F0Estimator {
    /// Selects the estimator from a "use precise estimator" flag.
    pub fn from_precise_flag(precise: bool) -> Self {
        if precise {
            F0Estimator::Precise
        } else {
            F0Estimator::Fast
        }
    }

    /// Returns the estimator name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            F0Estimator::Fast => "fast",
            F0Estimator::Precise => "precise",
        }
    }
}

/// Parameters for one retouch invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetouchParams {
    /// Analysis frame period in milliseconds.
    #[serde(default = "default_frame_period_ms")]
    pub frame_period_ms: f64,
    /// Lower F0 search bound in Hz.
    #[serde(default = "default_f0_floor")]
    pub f0_floor: f64,
    /// Upper F0 search bound in Hz.
    #[serde(default = "default_f0_ceil")]
    pub f0_ceil: f64,
    /// F0 estimator variant.
    #[serde(default)]
    pub estimator: F0Estimator,
    /// Pitch shift in semitones (positive = up).
    #[serde(default)]
    pub pitch_shift_semitones: f64,
    /// Formant shift in semitones (positive = up).
    #[serde(default)]
    pub formant_shift_semitones: f64,
    /// Breathiness adjustment in percent (-100 to 100).
    #[serde(default)]
    pub breathiness_percent: f64,
    /// Strength of the snap toward equal-tempered semitones (0 to 100).
    #[serde(default)]
    pub pitch_correction_percent: f64,
}

fn default_frame_period_ms() -> f64 {
    DEFAULT_FRAME_PERIOD_MS
}

fn default_f0_floor() -> f64 {
    DEFAULT_F0_FLOOR
}

fn default_f0_ceil() -> f64 {
    DEFAULT_F0_CEIL
}

impl Default for RetouchParams {
    fn default() -> Self {
        Self {
            frame_period_ms: DEFAULT_FRAME_PERIOD_MS,
            f0_floor: DEFAULT_F0_FLOOR,
            f0_ceil: DEFAULT_F0_CEIL,
            estimator: F0Estimator::Fast,
            pitch_shift_semitones: 0.0,
            formant_shift_semitones: 0.0,
            breathiness_percent: 0.0,
            pitch_correction_percent: 0.0,
        }
    }
}

impl RetouchParams {
    /// Creates a builder starting from the default parameters.
    pub fn builder() -> RetouchParamsBuilder {
        RetouchParamsBuilder::new()
    }

    /// Parses parameters from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads parameters from a JSON file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, SpecError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the parameters to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// F0 multiplier for the configured pitch shift.
    pub fn pitch_shift_rate(&self) -> f64 {
        semitones_to_rate(self.pitch_shift_semitones)
    }

    /// Breathiness retouch strength, clamped to [-1, 1].
    pub fn breathiness_level(&self) -> f64 {
        (self.breathiness_percent / 100.0).clamp(-1.0, 1.0)
    }

    /// Pitch correction amount, clamped to [0, 1].
    pub fn pitch_correction_amount(&self) -> f64 {
        (self.pitch_correction_percent / 100.0).clamp(0.0, 1.0)
    }
}

/// Converts a semitone offset into a frequency ratio.
pub fn semitones_to_rate(semitones: f64) -> f64 {
    2.0_f64.powf(semitones / 12.0)
}

/// Builder for [`RetouchParams`].
#[derive(Debug, Clone, Default)]
pub struct RetouchParamsBuilder {
    params: RetouchParams,
}

impl RetouchParamsBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the frame period in milliseconds.
    pub fn frame_period_ms(mut self, frame_period_ms: f64) -> Self {
        self.params.frame_period_ms = frame_period_ms;
        self
    }

    /// Sets the F0 search range in Hz.
    pub fn f0_range(mut self, floor: f64, ceil: f64) -> Self {
        self.params.f0_floor = floor;
        self.params.f0_ceil = ceil;
        self
    }

    /// Sets the F0 estimator.
    pub fn estimator(mut self, estimator: F0Estimator) -> Self {
        self.params.estimator = estimator;
        self
    }

    /// Sets the pitch shift in semitones.
    pub fn pitch_shift(mut self, semitones: f64) -> Self {
        self.params.pitch_shift_semitones = semitones;
        self
    }

    /// Sets the formant shift in semitones.
    pub fn formant_shift(mut self, semitones: f64) -> Self {
        self.params.formant_shift_semitones = semitones;
        self
    }

    /// Sets the breathiness adjustment in percent.
    pub fn breathiness(mut self, percent: f64) -> Self {
        self.params.breathiness_percent = percent;
        self
    }

    /// Sets the pitch correction strength in percent.
    pub fn pitch_correction(mut self, percent: f64) -> Self {
        self.params.pitch_correction_percent = percent;
        self
    }

    /// Builds the parameters.
    pub fn build(self) -> RetouchParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_json() {
        let params = RetouchParams::from_json("{}").unwrap();
        assert_eq!(params, RetouchParams::default());
        assert_eq!(params.frame_period_ms, 5.0);
        assert_eq!(params.f0_floor, 71.0);
        assert_eq!(params.f0_ceil, 800.0);
        assert_eq!(params.estimator, F0Estimator::Fast);
    }

    #[test]
    fn test_json_roundtrip_fields() {
        let json = r#"{
            "estimator": "precise",
            "pitch_shift_semitones": 12.0,
            "formant_shift_semitones": -3.0,
            "breathiness_percent": 30.0
        }"#;
        let params = RetouchParams::from_json(json).unwrap();
        assert_eq!(params.estimator, F0Estimator::Precise);
        assert_eq!(params.pitch_shift_semitones, 12.0);
        assert_eq!(params.formant_shift_semitones, -3.0);
        assert_eq!(params.breathiness_percent, 30.0);

        let reparsed = RetouchParams::from_json(&params.to_json_pretty().unwrap()).unwrap();
        assert_eq!(reparsed, params);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = RetouchParams::from_json(r#"{"pitch": 3}"#);
        assert!(matches!(result, Err(SpecError::JsonParse(_))));
    }

    #[test]
    fn test_builder() {
        let params = RetouchParams::builder()
            .f0_range(100.0, 400.0)
            .frame_period_ms(10.0)
            .estimator(F0Estimator::from_precise_flag(true))
            .pitch_shift(2.0)
            .formant_shift(1.0)
            .breathiness(-20.0)
            .pitch_correction(50.0)
            .build();
        assert_eq!(params.f0_floor, 100.0);
        assert_eq!(params.f0_ceil, 400.0);
        assert_eq!(params.frame_period_ms, 10.0);
        assert_eq!(params.estimator, F0Estimator::Precise);
        assert_eq!(params.breathiness_level(), -0.2);
        assert_eq!(params.pitch_correction_amount(), 0.5);
    }

    #[test]
    fn test_pitch_shift_rate() {
        assert_eq!(semitones_to_rate(0.0), 1.0);
        assert!((semitones_to_rate(12.0) - 2.0).abs() < 1e-12);
        assert!((semitones_to_rate(-12.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_breathiness_level_is_clamped() {
        let params = RetouchParams::builder().breathiness(250.0).build();
        assert_eq!(params.breathiness_level(), 1.0);
        let params = RetouchParams::builder().breathiness(-250.0).build();
        assert_eq!(params.breathiness_level(), -1.0);
    }

    #[test]
    fn test_estimator_serde_names() {
        assert_eq!(serde_json::to_string(&F0Estimator::Fast).unwrap(), "\"fast\"");
        assert_eq!(F0Estimator::Precise.as_str(), "precise");
        assert_eq!(F0Estimator::from_precise_flag(false), F0Estimator::Fast);
    }
}
