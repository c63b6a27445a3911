//! Band aperiodicity estimation.
//!
//! Each voiced frame is analysed with a window spanning six periods, long
//! enough to resolve individual harmonics. Within every band the power found
//! between harmonics is compared to the band's overall power; a perfectly
//! periodic band scores near zero and a noisy one near one.

use crate::error::RetouchResult;
use crate::frame_buffer::SpectralFrameBuffer;

use super::dsp::{centered_segment, hann_window, time_to_sample, PowerSpectrum};
use super::Signal;

/// Width of an aperiodicity band in Hz.
pub(crate) const BAND_WIDTH_HZ: f64 = 3000.0;

/// Window length in periods of F0.
const WINDOW_PERIODS: f64 = 6.0;

/// Distance from the nearest harmonic, in units of F0, beyond which a bin
/// counts as inter-harmonic.
const INTER_HARMONIC_DISTANCE: f64 = 0.35;

/// Lowest aperiodicity reported for a band.
const MIN_APERIODICITY: f64 = 0.001;

pub(crate) fn estimate(
    signal: Signal<'_>,
    time_markers: &[f64],
    f0: &[f64],
    fft_size: usize,
) -> RetouchResult<SpectralFrameBuffer> {
    let bins = fft_size / 2 + 1;
    let mut aperiodicity = SpectralFrameBuffer::new(time_markers.len(), bins)?;

    let fs = signal.sample_rate as f64;
    let nyquist = fs / 2.0;
    let centers = band_centers(nyquist);
    let analysis_size = 2 * fft_size;
    let mut spectrum = PowerSpectrum::new(analysis_size);

    for ((row, &t), &frame_f0) in aperiodicity.rows_mut().zip(time_markers).zip(f0) {
        if frame_f0 <= 0.0 {
            row.fill(1.0);
            continue;
        }

        let len = ((WINDOW_PERIODS * fs / frame_f0).round() as usize).clamp(4, analysis_size);
        let window = hann_window(len);
        let center = time_to_sample(t, signal.sample_rate);
        let frame: Vec<f64> = centered_segment(signal.samples, center, len)
            .iter()
            .zip(&window)
            .map(|(x, w)| x * w)
            .collect();
        let power = spectrum.compute(&frame);

        let values = band_values(power, frame_f0, fs, analysis_size, centers.len());
        for (bin, slot) in row.iter_mut().enumerate() {
            let freq = bin as f64 * fs / fft_size as f64;
            *slot = interpolate_bands(&centers, &values, freq);
        }
    }

    Ok(aperiodicity)
}

/// Band centers up to `nyquist`; the last band may be narrower.
fn band_centers(nyquist: f64) -> Vec<f64> {
    let count = (nyquist / BAND_WIDTH_HZ).ceil().max(1.0) as usize;
    (0..count)
        .map(|b| {
            let low = b as f64 * BAND_WIDTH_HZ;
            let high = (low + BAND_WIDTH_HZ).min(nyquist);
            0.5 * (low + high)
        })
        .collect()
}

fn band_values(power: &[f64], f0: f64, fs: f64, analysis_size: usize, bands: usize) -> Vec<f64> {
    #[derive(Clone, Copy, Default)]
    struct Band {
        total: f64,
        total_bins: usize,
        inter: f64,
        inter_bins: usize,
    }

    let mut acc = vec![Band::default(); bands];
    for (bin, &p) in power.iter().enumerate() {
        let freq = bin as f64 * fs / analysis_size as f64;
        if freq < 0.5 * f0 {
            continue;
        }
        let band = ((freq / BAND_WIDTH_HZ) as usize).min(bands - 1);
        let slot = &mut acc[band];
        slot.total += p;
        slot.total_bins += 1;

        let ratio = freq / f0;
        if (ratio - ratio.round()).abs() > INTER_HARMONIC_DISTANCE {
            slot.inter += p;
            slot.inter_bins += 1;
        }
    }

    acc.iter()
        .map(|band| {
            if band.inter_bins == 0 || band.total <= 0.0 {
                return 1.0;
            }
            let inter_mean = band.inter / band.inter_bins as f64;
            let total_mean = band.total / band.total_bins as f64;
            (inter_mean / total_mean).clamp(MIN_APERIODICITY, 1.0)
        })
        .collect()
}

/// Piecewise-linear interpolation between band centers, held flat past
/// either end.
fn interpolate_bands(centers: &[f64], values: &[f64], freq: f64) -> f64 {
    let last = centers.len() - 1;
    if freq <= centers[0] {
        return values[0];
    }
    if freq >= centers[last] {
        return values[last];
    }
    let right = centers.partition_point(|&c| c <= freq);
    let left = right - 1;
    let frac = (freq - centers[left]) / (centers[right] - centers[left]);
    values[left] + (values[right] - values[left]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;
    use std::f64::consts::PI;

    use crate::rng::create_rng;

    #[test]
    fn test_band_centers() {
        assert_eq!(band_centers(8000.0), vec![1500.0, 4500.0, 7000.0]);
        assert_eq!(band_centers(1000.0), vec![500.0]);
    }

    #[test]
    fn test_interpolation_holds_ends() {
        let centers = [1500.0, 4500.0];
        let values = [0.2, 0.8];
        assert_eq!(interpolate_bands(&centers, &values, 0.0), 0.2);
        assert_eq!(interpolate_bands(&centers, &values, 8000.0), 0.8);
        assert!((interpolate_bands(&centers, &values, 3000.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unvoiced_frames_are_fully_aperiodic() {
        let samples = vec![0.1; 4000];
        let ap = estimate(Signal::new(&samples, 16_000), &[0.1], &[0.0], 1024).unwrap();
        assert_eq!(ap.shape(), (1, 513));
        assert!(ap.row(0).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_harmonic_signal_is_periodic_and_noise_is_not() {
        let fs = 16_000;
        let harmonic: Vec<f64> = (0..8_000)
            .map(|n| {
                let t = n as f64 / fs as f64;
                (1..=10)
                    .map(|k| 0.1 * (2.0 * PI * 200.0 * k as f64 * t).sin())
                    .sum()
            })
            .collect();
        let mut rng = create_rng(3);
        let noise: Vec<f64> = (0..8_000).map(|_| rng.gen_range(-0.5..0.5)).collect();

        let periodic = estimate(Signal::new(&harmonic, fs), &[0.25], &[200.0], 1024).unwrap();
        let noisy = estimate(Signal::new(&noise, fs), &[0.25], &[200.0], 1024).unwrap();

        // Bin 64 is 1 kHz, inside the first band.
        assert!(periodic.row(0)[64] < 0.05, "periodic {}", periodic.row(0)[64]);
        assert!(noisy.row(0)[64] > 0.3, "noisy {}", noisy.row(0)[64]);
        assert!(periodic
            .as_slice()
            .iter()
            .all(|&v| (MIN_APERIODICITY..=1.0).contains(&v)));
    }
}
