//! Test signal generators and level measurements.

use std::f64::consts::PI;

/// A sine of `freq` Hz and peak `amplitude`, `len` samples long.
///
/// # Example
///
/// ```rust
/// use retouch_tests::signal::sine;
///
/// let tone = sine(220.0, 0.5, 16_000, 160);
/// assert_eq!(tone.len(), 160);
/// assert_eq!(tone[0], 0.0);
/// ```
pub fn sine(freq: f64, amplitude: f64, sample_rate: u32, len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| amplitude * (2.0 * PI * freq * n as f64 / sample_rate as f64).sin())
        .collect()
}

/// A voice-like tone: `partials` harmonics of `f0` with `1/k` amplitudes,
/// normalized to a peak of roughly `amplitude`.
pub fn harmonic_tone(
    f0: f64,
    partials: usize,
    amplitude: f64,
    sample_rate: u32,
    len: usize,
) -> Vec<f64> {
    let norm: f64 = (1..=partials).map(|k| 1.0 / k as f64).sum();
    (0..len)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            let sum: f64 = (1..=partials)
                .map(|k| (2.0 * PI * f0 * k as f64 * t).sin() / k as f64)
                .sum();
            amplitude * sum / norm
        })
        .collect()
}

/// Root mean square of `samples`; 0 for empty input.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Largest absolute sample value; 0 for empty input.
pub fn peak_amplitude(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |max, s| max.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_rms() {
        let tone = sine(100.0, 1.0, 8_000, 8_000);
        assert!((rms(&tone) - 0.5_f64.sqrt()).abs() < 1e-3);
        assert!((peak_amplitude(&tone) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_harmonic_tone_is_bounded() {
        let tone = harmonic_tone(150.0, 8, 0.5, 16_000, 4_000);
        assert!(peak_amplitude(&tone) <= 0.5 + 1e-9);
        assert!(rms(&tone) > 0.05);
    }

    #[test]
    fn test_empty_measurements() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(peak_amplitude(&[]), 0.0);
    }
}
