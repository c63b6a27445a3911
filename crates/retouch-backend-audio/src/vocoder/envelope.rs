//! Pitch-adaptive spectral envelope estimation.

use crate::error::RetouchResult;
use crate::frame_buffer::SpectralFrameBuffer;

use super::dsp::{centered_segment, hann_window, reflect_index, time_to_sample, PowerSpectrum};
use super::{EnvelopeEstimate, Signal};

/// Lowest F0 the analysis window is sized for.
pub(crate) const ENVELOPE_F0_FLOOR: f64 = 71.0;

/// F0 assumed for unvoiced frames.
const UNVOICED_F0: f64 = 500.0;

/// Window length in periods of F0.
const WINDOW_PERIODS: f64 = 3.0;

/// Smallest value stored in the envelope.
const ENVELOPE_FLOOR: f64 = 1e-12;

/// FFT size used for a sample rate.
///
/// Large enough to hold a three-period window at [`ENVELOPE_F0_FLOOR`].
pub(crate) fn fft_size_for(sample_rate: u32) -> usize {
    let span = WINDOW_PERIODS * sample_rate as f64 / ENVELOPE_F0_FLOOR + 1.0;
    1usize << (1 + span.log2().floor() as u32)
}

pub(crate) fn estimate(
    signal: Signal<'_>,
    time_markers: &[f64],
    f0: &[f64],
) -> RetouchResult<EnvelopeEstimate> {
    let fs = signal.sample_rate as f64;
    let fft_size = fft_size_for(signal.sample_rate);
    let bins = fft_size / 2 + 1;
    let mut envelope = SpectralFrameBuffer::new(time_markers.len(), bins)?;
    let mut spectrum = PowerSpectrum::new(fft_size);

    for ((row, &t), &frame_f0) in envelope.rows_mut().zip(time_markers).zip(f0) {
        let f0_eff = if frame_f0 >= ENVELOPE_F0_FLOOR {
            frame_f0
        } else {
            UNVOICED_F0
        };

        let len = ((WINDOW_PERIODS * fs / f0_eff).round() as usize).clamp(4, fft_size);
        let window = hann_window(len);
        let energy: f64 = window.iter().map(|w| w * w).sum();
        let center = time_to_sample(t, signal.sample_rate);
        let frame: Vec<f64> = centered_segment(signal.samples, center, len)
            .iter()
            .zip(&window)
            .map(|(x, w)| x * w)
            .collect();

        let power = spectrum.compute(&frame);
        let half_width = (f0_eff * fft_size as f64 / (2.0 * fs)).round() as usize;
        smooth_into(power, half_width, energy, row);
    }

    Ok(EnvelopeEstimate { envelope, fft_size })
}

/// Moving average of `power / norm` over `2 * half_width + 1` bins, mirrored
/// at both ends of the spectrum.
fn smooth_into(power: &[f64], half_width: usize, norm: f64, out: &mut [f64]) {
    let len = power.len();
    let h = half_width as isize;

    let mut prefix = Vec::with_capacity(len + 2 * half_width + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for i in -h..len as isize + h {
        acc += power[reflect_index(i, len)];
        prefix.push(acc);
    }

    let span = 2 * half_width + 1;
    for (k, slot) in out.iter_mut().enumerate() {
        let mean = (prefix[k + span] - prefix[k]) / span as f64;
        *slot = (mean / norm).max(ENVELOPE_FLOOR);
    }
}
