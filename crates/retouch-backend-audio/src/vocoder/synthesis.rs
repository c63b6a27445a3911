//! Waveform synthesis from F0, envelope and aperiodicity.
//!
//! The periodic part is a bank of phase-continuous harmonics whose amplitudes
//! follow `P·(1 - ap)`. The aperiodic part is seeded white noise shaped by
//! `P·ap` in short overlapping blocks.

use std::f64::consts::PI;

use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::formant::lerp;
use crate::rng::create_component_rng;

use super::dsp::sample_spectrum;
use super::SynthesisRequest;

/// Component key of the noise stream.
pub(crate) const NOISE_COMPONENT: &str = "aperiodic_noise";

/// Smallest noise block in samples.
const MIN_NOISE_BLOCK: usize = 64;

pub(crate) fn synthesize(request: &SynthesisRequest<'_>, seed: u32) -> Vec<f64> {
    let mut output = vec![0.0; request.output_len];
    add_periodic(request, &mut output);
    add_aperiodic(request, seed, &mut output);
    output
}

/// Frame pair and blend weight for a time in seconds.
fn frame_position(time: f64, frame_period_ms: f64, frame_count: usize) -> (usize, usize, f64) {
    let last = frame_count - 1;
    let position = (time * 1000.0 / frame_period_ms).max(0.0);
    let left = (position.floor() as usize).min(last);
    let right = (left + 1).min(last);
    let frac = if left == last {
        0.0
    } else {
        position - left as f64
    };
    (left, right, frac)
}

/// Harmonic amplitude for a power density row at `freq`.
fn harmonic_amplitude(
    envelope: &[f64],
    aperiodicity: &[f64],
    freq: f64,
    f0: f64,
    sample_rate: u32,
    fft_size: usize,
) -> f64 {
    let power = sample_spectrum(envelope, freq, sample_rate, fft_size);
    let ap = sample_spectrum(aperiodicity, freq, sample_rate, fft_size);
    (4.0 * f0 * power * (1.0 - ap) / sample_rate as f64)
        .max(0.0)
        .sqrt()
}

fn add_periodic(request: &SynthesisRequest<'_>, output: &mut [f64]) {
    let fs = request.sample_rate as f64;
    let nyquist = fs / 2.0;
    let frames = request.f0.len();
    let mut phase = 0.0;

    for (n, sample) in output.iter_mut().enumerate() {
        let (i0, i1, a) = frame_position(n as f64 / fs, request.frame_period_ms, frames);
        let (f0a, f0b) = (request.f0[i0], request.f0[i1]);
        let f0 = if f0a > 0.0 && f0b > 0.0 {
            lerp(f0a, f0b, a)
        } else if a < 0.5 {
            f0a
        } else {
            f0b
        };
        if f0 <= 0.0 {
            continue;
        }

        phase = (phase + 2.0 * PI * f0 / fs) % (2.0 * PI);

        let env = (request.envelope.row(i0), request.envelope.row(i1));
        let ap = (request.aperiodicity.row(i0), request.aperiodicity.row(i1));
        let mut value = 0.0;
        let mut k = 1;
        while k as f64 * f0 < nyquist {
            let freq = k as f64 * f0;
            let left =
                harmonic_amplitude(env.0, ap.0, freq, f0, request.sample_rate, request.fft_size);
            let right =
                harmonic_amplitude(env.1, ap.1, freq, f0, request.sample_rate, request.fft_size);
            value += lerp(left, right, a) * (k as f64 * phase).sin();
            k += 1;
        }
        *sample += value;
    }
}

/// Per-bin noise gains `sqrt(P·ap)` of one frame for a block FFT.
fn noise_gains(request: &SynthesisRequest<'_>, frame: usize, block: usize) -> Vec<f64> {
    let fs = request.sample_rate as f64;
    let envelope = request.envelope.row(frame);
    let aperiodicity = request.aperiodicity.row(frame);
    (0..block)
        .map(|m| {
            let freq = m.min(block - m) as f64 * fs / block as f64;
            let p = sample_spectrum(envelope, freq, request.sample_rate, request.fft_size);
            let ap = sample_spectrum(aperiodicity, freq, request.sample_rate, request.fft_size);
            (p * ap).max(0.0).sqrt()
        })
        .collect()
}

fn add_aperiodic(request: &SynthesisRequest<'_>, seed: u32, output: &mut [f64]) {
    let block = (request.fft_size / 4).max(MIN_NOISE_BLOCK);
    let hop = block / 2;
    let fs = request.sample_rate as f64;
    let frames = request.f0.len();

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(block);
    let inverse = planner.plan_fft_inverse(block);
    let window: Vec<f64> = (0..block)
        .map(|n| (PI * (n as f64 + 0.5) / block as f64).sin())
        .collect();
    let mut rng = create_component_rng(seed, NOISE_COMPONENT);
    let scale = 3.0_f64.sqrt();
    let mut buffer = vec![Complex::new(0.0, 0.0); block];
    let mut start = -(hop as isize);

    while start < output.len() as isize {
        let center = (start + (block / 2) as isize) as f64 / fs;
        let frame = ((center.max(0.0) * 1000.0 / request.frame_period_ms).round() as usize)
            .min(frames - 1);
        let gains = noise_gains(request, frame, block);

        for (slot, w) in buffer.iter_mut().zip(&window) {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            *slot = Complex::new(noise * scale * w, 0.0);
        }
        forward.process(&mut buffer);
        for (slot, gain) in buffer.iter_mut().zip(&gains) {
            *slot *= *gain;
        }
        inverse.process(&mut buffer);

        for (i, (value, w)) in buffer.iter().zip(&window).enumerate() {
            let idx = start + i as isize;
            if idx >= 0 && (idx as usize) < output.len() {
                output[idx as usize] += value.re / block as f64 * w;
            }
        }
        start += hop as isize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_buffer::SpectralFrameBuffer;
    use pretty_assertions::assert_eq;

    fn flat(frames: usize, bins: usize, value: f64) -> SpectralFrameBuffer {
        let mut buffer = SpectralFrameBuffer::new(frames, bins).unwrap();
        buffer.as_mut_slice().fill(value);
        buffer
    }

    fn request<'a>(
        f0: &'a [f64],
        envelope: &'a SpectralFrameBuffer,
        aperiodicity: &'a SpectralFrameBuffer,
        output_len: usize,
    ) -> SynthesisRequest<'a> {
        SynthesisRequest {
            f0,
            envelope,
            aperiodicity,
            fft_size: 1024,
            frame_period_ms: 5.0,
            sample_rate: 16_000,
            output_len,
        }
    }

    #[test]
    fn test_frame_position() {
        assert_eq!(frame_position(0.0, 5.0, 3), (0, 1, 0.0));
        let (i0, i1, a) = frame_position(0.0075, 5.0, 3);
        assert_eq!((i0, i1), (1, 2));
        assert!((a - 0.5).abs() < 1e-9);
        assert_eq!(frame_position(1.0, 5.0, 3), (2, 2, 0.0));
    }

    #[test]
    fn test_output_length_is_exact() {
        let f0 = vec![200.0; 5];
        let env = flat(5, 513, 1e-3);
        let ap = flat(5, 513, 0.5);
        let out = synthesize(&request(&f0, &env, &ap, 333), 1);
        assert_eq!(out.len(), 333);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_silent_envelope_gives_silence() {
        let f0 = vec![200.0, 0.0, 150.0];
        let env = flat(3, 513, 0.0);
        let ap = flat(3, 513, 0.5);
        let out = synthesize(&request(&f0, &env, &ap, 160), 1);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let f0 = vec![0.0; 21];
        let env = flat(21, 513, 1e-2);
        let ap = flat(21, 513, 1.0);
        let a = synthesize(&request(&f0, &env, &ap, 1_600), 9);
        let b = synthesize(&request(&f0, &env, &ap, 1_600), 9);
        let c = synthesize(&request(&f0, &env, &ap, 1_600), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_periodic_amplitude_matches_envelope() {
        // A flat density P with zero aperiodicity gives harmonics of
        // amplitude sqrt(4·f0·P/fs).
        let f0 = vec![4000.0; 41];
        let density = 0.5;
        let env = flat(41, 513, density);
        let ap = flat(41, 513, 0.0);
        let out = synthesize(&request(&f0, &env, &ap, 3_200), 1);
        let expected = (4.0 * 4000.0 * density / 16_000.0_f64).sqrt();
        let peak = out[1_000..2_000].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!((peak - expected).abs() < 0.01 * expected, "peak {peak}");
    }
}
