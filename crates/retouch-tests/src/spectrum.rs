//! Spectral measurements for checking retouched output.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Frequency in Hz of the strongest spectral peak of `samples`.
///
/// The signal is Hann-windowed and zero-padded to at least four times its
/// length, and the peak is refined by parabolic interpolation. DC is ignored.
/// Returns 0 for signals shorter than two samples.
pub fn dominant_frequency(samples: &[f64], sample_rate: u32) -> f64 {
    let len = samples.len();
    if len < 2 {
        return 0.0;
    }

    let size = (4 * len).next_power_of_two();
    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .enumerate()
        .map(|(n, &x)| {
            let w = 0.5 - 0.5 * (2.0 * PI * n as f64 / (len - 1) as f64).cos();
            Complex::new(x * w, 0.0)
        })
        .collect();
    buffer.resize(size, Complex::new(0.0, 0.0));

    FftPlanner::new().plan_fft_forward(size).process(&mut buffer);
    let magnitude: Vec<f64> = buffer[..=size / 2].iter().map(|c| c.norm()).collect();

    let (peak, _) = magnitude
        .iter()
        .enumerate()
        .skip(1)
        .fold((1, f64::MIN), |best, (i, &m)| if m > best.1 { (i, m) } else { best });

    let offset = if peak + 1 < magnitude.len() {
        let (a, b, c) = (magnitude[peak - 1], magnitude[peak], magnitude[peak + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > f64::EPSILON {
            0.5 * (a - c) / denom
        } else {
            0.0
        }
    } else {
        0.0
    };

    (peak as f64 + offset) * sample_rate as f64 / size as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{harmonic_tone, sine};

    #[test]
    fn test_dominant_frequency_of_sine() {
        let tone = sine(220.0, 0.5, 16_000, 16_000);
        assert!((dominant_frequency(&tone, 16_000) - 220.0).abs() < 0.5);
    }

    #[test]
    fn test_dominant_frequency_of_harmonic_tone_is_fundamental() {
        let tone = harmonic_tone(180.0, 6, 0.5, 16_000, 8_000);
        assert!((dominant_frequency(&tone, 16_000) - 180.0).abs() < 1.0);
    }

    #[test]
    fn test_short_input() {
        assert_eq!(dominant_frequency(&[1.0], 16_000), 0.0);
    }
}
