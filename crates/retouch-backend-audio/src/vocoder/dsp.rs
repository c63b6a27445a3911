//! Shared signal helpers for the reference vocoder.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Hann window of `len` samples with non-zero end points.
pub fn hann_window(len: usize) -> Vec<f64> {
    let denom = (len + 1) as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * (i + 1) as f64 / denom).cos())
        .collect()
}

/// Copies `len` samples centered on `center`, zero-filling outside the signal.
pub fn centered_segment(samples: &[f64], center: isize, len: usize) -> Vec<f64> {
    let start = center - (len / 2) as isize;
    (0..len)
        .map(|i| {
            let idx = start + i as isize;
            if idx >= 0 && (idx as usize) < samples.len() {
                samples[idx as usize]
            } else {
                0.0
            }
        })
        .collect()
}

/// Sample index closest to time `seconds`.
pub fn time_to_sample(seconds: f64, sample_rate: u32) -> isize {
    (seconds * sample_rate as f64).round() as isize
}

/// Vertex offset of the parabola through `(-1, a)`, `(0, b)`, `(1, c)`.
///
/// Returns 0 when the points are collinear.
pub fn parabolic_offset(a: f64, b: f64, c: f64) -> f64 {
    let denom = a - 2.0 * b + c;
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (0.5 * (a - c) / denom).clamp(-1.0, 1.0)
}

/// Reflects an index into `[0, len)` by mirroring at both ends.
pub fn reflect_index(index: isize, len: usize) -> usize {
    if len < 2 {
        return 0;
    }
    let period = (2 * (len - 1)) as isize;
    let mut x = index.rem_euclid(period);
    if x >= len as isize {
        x = period - x;
    }
    x as usize
}

/// Linearly interpolated value of a half-spectrum row at `freq` Hz.
///
/// Frequencies past the last bin return the last bin.
pub fn sample_spectrum(row: &[f64], freq: f64, sample_rate: u32, fft_size: usize) -> f64 {
    let last = row.len() - 1;
    let pos = (freq * fft_size as f64 / sample_rate as f64).clamp(0.0, last as f64);
    let left = pos.floor() as usize;
    if left >= last {
        return row[last];
    }
    let frac = pos - left as f64;
    row[left] + (row[left + 1] - row[left]) * frac
}

/// Forward power spectrum with a reusable FFT plan.
pub struct PowerSpectrum {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex<f64>>,
    power: Vec<f64>,
}

impl PowerSpectrum {
    /// Plans a forward FFT of `fft_size` points.
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            power: vec![0.0; fft_size / 2 + 1],
        }
    }

    /// FFT size.
    pub fn fft_size(&self) -> usize {
        self.scratch.len()
    }

    /// `|X(k)|^2` for `k` in `0..=fft_size/2` of `frame`, zero-padded.
    ///
    /// Samples beyond `fft_size` are ignored.
    pub fn compute(&mut self, frame: &[f64]) -> &[f64] {
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let value = frame.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(value, 0.0);
        }
        self.fft.process(&mut self.scratch);
        for (p, x) in self.power.iter_mut().zip(&self.scratch) {
            *p = x.norm_sqr();
        }
        &self.power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hann_window_shape() {
        let w = hann_window(7);
        assert_eq!(w.len(), 7);
        assert!((w[3] - 1.0).abs() < 1e-12);
        assert!((w[0] - w[6]).abs() < 1e-12);
        assert!(w[0] > 0.0);
    }

    #[test]
    fn test_centered_segment_zero_pads() {
        let samples = [1.0, 2.0, 3.0];
        assert_eq!(centered_segment(&samples, 0, 4), vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(centered_segment(&samples, 2, 4), vec![1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_parabolic_offset() {
        // y = -(x - 0.25)^2
        let f = |x: f64| -(x - 0.25) * (x - 0.25);
        assert!((parabolic_offset(f(-1.0), f(0.0), f(1.0)) - 0.25).abs() < 1e-12);
        assert_eq!(parabolic_offset(1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 5), 1);
        assert_eq!(reflect_index(-2, 5), 2);
        assert_eq!(reflect_index(4, 5), 4);
        assert_eq!(reflect_index(5, 5), 3);
        assert_eq!(reflect_index(3, 1), 0);
    }

    #[test]
    fn test_sample_spectrum_interpolates() {
        let row = [0.0, 1.0, 2.0, 3.0, 4.0];
        // 8-point FFT at 8 Hz: bin spacing 1 Hz.
        assert!((sample_spectrum(&row, 1.5, 8, 8) - 1.5).abs() < 1e-12);
        assert_eq!(sample_spectrum(&row, 100.0, 8, 8), 4.0);
        assert_eq!(sample_spectrum(&row, -1.0, 8, 8), 0.0);
    }

    #[test]
    fn test_power_spectrum_of_impulse_is_flat() {
        let mut spectrum = PowerSpectrum::new(16);
        let power = spectrum.compute(&[1.0]);
        assert_eq!(power.len(), 9);
        assert!(power.iter().all(|&p| (p - 1.0).abs() < 1e-12));
    }
}
