//! F0 contour retouching: transposition and semitone correction.

use retouch_spec::semitones_to_rate;

use crate::formant::lerp;

/// Reference pitch for equal-tempered correction (A4).
pub const CONCERT_PITCH_HZ: f64 = 440.0;

/// Multiplies every F0 value by `2^(semitones/12)`.
///
/// Unvoiced frames (`0.0`) stay unvoiced.
pub fn shift_f0(f0: &mut [f64], semitones: f64) {
    let rate = semitones_to_rate(semitones);
    for value in f0.iter_mut() {
        *value *= rate;
    }
}

/// Pulls voiced F0 values toward the nearest equal-tempered semitone.
///
/// `amount` of 0 leaves the contour untouched, 1 snaps every voiced frame
/// onto the semitone grid. Values are clamped to `[0, 1]`.
pub fn correct_pitch(f0: &mut [f64], amount: f64) {
    let amount = amount.clamp(0.0, 1.0);
    if amount == 0.0 {
        return;
    }
    for value in f0.iter_mut().filter(|v| **v > 0.0) {
        let semitones = 12.0 * (*value / CONCERT_PITCH_HZ).log2();
        let corrected = lerp(semitones, semitones.round(), amount);
        *value = CONCERT_PITCH_HZ * semitones_to_rate(corrected);
    }
}

/// Number of voiced frames in a contour.
pub fn voiced_count(f0: &[f64]) -> usize {
    f0.iter().filter(|&&v| v > 0.0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shift_is_elementwise_product() {
        let original = vec![0.0, 100.0, 220.0, 0.0, 331.5];
        let mut f0 = original.clone();
        shift_f0(&mut f0, 7.0);
        let rate = 2.0_f64.powf(7.0 / 12.0);
        let expected: Vec<f64> = original.iter().map(|v| v * rate).collect();
        assert_eq!(f0, expected);
    }

    #[test]
    fn test_octave_shift() {
        let mut f0 = vec![220.0, 0.0];
        shift_f0(&mut f0, 12.0);
        assert!((f0[0] - 440.0).abs() < 1e-9);
        assert_eq!(f0[1], 0.0);
    }

    #[test]
    fn test_full_correction_snaps_to_semitones() {
        // 450 Hz is ~0.39 semitones above A4.
        let mut f0 = vec![450.0, 0.0, 228.0];
        correct_pitch(&mut f0, 1.0);
        assert!((f0[0] - 440.0).abs() < 1e-9);
        assert_eq!(f0[1], 0.0);
        // 228 Hz is nearest to A#3 (233.08 Hz).
        assert!((f0[2] - 233.0819).abs() < 1e-3);
    }

    #[test]
    fn test_partial_correction_moves_halfway() {
        let mut f0 = vec![450.0];
        correct_pitch(&mut f0, 0.5);
        let semitones = 12.0 * (450.0_f64 / 440.0).log2();
        let expected = 440.0 * 2.0_f64.powf(semitones / 2.0 / 12.0);
        assert!((f0[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_correction_is_identity() {
        let mut f0 = vec![123.456, 0.0, 789.0];
        correct_pitch(&mut f0, 0.0);
        assert_eq!(f0, vec![123.456, 0.0, 789.0]);
    }

    #[test]
    fn test_voiced_count() {
        assert_eq!(voiced_count(&[0.0, 100.0, 0.0, 120.0]), 2);
    }
}
