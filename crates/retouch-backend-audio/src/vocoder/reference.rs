//! The bundled FFT-based vocoder.

use retouch_spec::F0Estimator;

use crate::error::{RetouchError, RetouchResult};
use crate::frame_buffer::SpectralFrameBuffer;

use super::{
    aperiodicity, envelope, f0, synthesis, EnvelopeEstimate, F0Contour, F0Options, Signal,
    SynthesisRequest, Vocoder,
};

/// Default seed of the noise excitation.
pub const DEFAULT_NOISE_SEED: u32 = 42;

/// Reference analysis/synthesis implementation.
///
/// Analysis is deterministic. Synthesis draws its noise excitation from a
/// PCG32 stream derived from `seed`, so identical inputs and seeds produce
/// identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceVocoder {
    seed: u32,
}

impl ReferenceVocoder {
    /// Creates a vocoder with [`DEFAULT_NOISE_SEED`].
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_NOISE_SEED)
    }

    /// Creates a vocoder with an explicit noise seed.
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    /// Noise seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for ReferenceVocoder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_signal(stage: &'static str, signal: &Signal<'_>) -> RetouchResult<()> {
    if signal.sample_rate == 0 {
        return Err(RetouchError::estimation(stage, "sample rate is zero"));
    }
    if signal.is_empty() {
        return Err(RetouchError::estimation(stage, "signal is empty"));
    }
    if let Some(idx) = signal.samples.iter().position(|x| !x.is_finite()) {
        return Err(RetouchError::estimation(
            stage,
            format!("sample {} is not finite", idx),
        ));
    }
    Ok(())
}

fn check_frames(stage: &'static str, time_markers: &[f64], f0: &[f64]) -> RetouchResult<()> {
    if time_markers.is_empty() {
        return Err(RetouchError::estimation(stage, "no analysis frames"));
    }
    if time_markers.len() != f0.len() {
        return Err(RetouchError::estimation(
            stage,
            format!(
                "{} time markers but {} f0 values",
                time_markers.len(),
                f0.len()
            ),
        ));
    }
    if f0.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(RetouchError::estimation(
            stage,
            "f0 must be finite and non-negative",
        ));
    }
    Ok(())
}

fn check_fft_size(stage: &'static str, fft_size: usize) -> RetouchResult<()> {
    if fft_size < 4 || !fft_size.is_power_of_two() {
        return Err(RetouchError::estimation(
            stage,
            format!("fft size {} is not a power of two >= 4", fft_size),
        ));
    }
    Ok(())
}

impl Vocoder for ReferenceVocoder {
    fn frame_count(
        &self,
        _estimator: F0Estimator,
        sample_rate: u32,
        sample_count: usize,
        frame_period_ms: f64,
    ) -> usize {
        f0::frame_count(sample_rate, sample_count, frame_period_ms)
    }

    fn estimate_f0(&self, signal: Signal<'_>, options: &F0Options) -> RetouchResult<F0Contour> {
        const STAGE: &str = "estimate_f0";
        check_signal(STAGE, &signal)?;
        if !(options.frame_period_ms > 0.0)
            || !(options.f0_floor > 0.0)
            || !(options.f0_floor < options.f0_ceil)
        {
            return Err(RetouchError::estimation(
                STAGE,
                format!(
                    "unusable options: floor {} Hz, ceil {} Hz, period {} ms",
                    options.f0_floor, options.f0_ceil, options.frame_period_ms
                ),
            ));
        }
        f0::estimate(signal, options)
    }

    fn refine_f0(&self, signal: Signal<'_>, contour: &F0Contour) -> RetouchResult<Vec<f64>> {
        const STAGE: &str = "refine_f0";
        check_signal(STAGE, &signal)?;
        check_frames(STAGE, &contour.time_markers, &contour.f0)?;
        f0::refine(signal, contour)
    }

    fn estimate_envelope(
        &self,
        signal: Signal<'_>,
        time_markers: &[f64],
        f0: &[f64],
    ) -> RetouchResult<EnvelopeEstimate> {
        const STAGE: &str = "estimate_envelope";
        check_signal(STAGE, &signal)?;
        check_frames(STAGE, time_markers, f0)?;
        envelope::estimate(signal, time_markers, f0)
    }

    fn estimate_aperiodicity(
        &self,
        signal: Signal<'_>,
        time_markers: &[f64],
        f0: &[f64],
        fft_size: usize,
    ) -> RetouchResult<SpectralFrameBuffer> {
        const STAGE: &str = "estimate_aperiodicity";
        check_signal(STAGE, &signal)?;
        check_frames(STAGE, time_markers, f0)?;
        check_fft_size(STAGE, fft_size)?;
        aperiodicity::estimate(signal, time_markers, f0, fft_size)
    }

    fn synthesize(&self, request: SynthesisRequest<'_>) -> RetouchResult<Vec<f64>> {
        const STAGE: &str = "synthesize";
        check_fft_size(STAGE, request.fft_size)?;
        if request.sample_rate == 0 || !(request.frame_period_ms > 0.0) {
            return Err(RetouchError::estimation(
                STAGE,
                "sample rate and frame period must be positive",
            ));
        }

        let frames = request.f0.len();
        let bins = request.fft_size / 2 + 1;
        let expected = (frames, bins);
        if frames == 0
            || request.envelope.shape() != expected
            || request.aperiodicity.shape() != expected
        {
            return Err(RetouchError::estimation(
                STAGE,
                format!(
                    "expected {}x{} envelopes, got {:?} and {:?}",
                    frames,
                    bins,
                    request.envelope.shape(),
                    request.aperiodicity.shape()
                ),
            ));
        }
        if request.f0.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(RetouchError::estimation(
                STAGE,
                "f0 must be finite and non-negative",
            ));
        }

        Ok(synthesis::synthesize(&request, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::f64::consts::PI;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| 0.5 * (2.0 * PI * freq * n as f64 / 16_000.0).sin())
            .collect()
    }

    fn options() -> F0Options {
        F0Options {
            estimator: F0Estimator::Fast,
            f0_floor: 71.0,
            f0_ceil: 800.0,
            frame_period_ms: 5.0,
        }
    }

    #[test]
    fn test_vocoder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReferenceVocoder>();
        assert_eq!(ReferenceVocoder::default().seed(), DEFAULT_NOISE_SEED);
    }

    #[test]
    fn test_non_finite_signal_fails() {
        let mut samples = sine(220.0, 1_600);
        samples[10] = f64::NAN;
        let err = ReferenceVocoder::new()
            .estimate_f0(Signal::new(&samples, 16_000), &options())
            .unwrap_err();
        assert!(matches!(
            err,
            RetouchError::EstimationFailure {
                stage: "estimate_f0",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_signal_fails() {
        let err = ReferenceVocoder::new()
            .estimate_f0(Signal::new(&[], 16_000), &options())
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_mismatched_contour_fails() {
        let samples = sine(220.0, 1_600);
        let err = ReferenceVocoder::new()
            .estimate_envelope(Signal::new(&samples, 16_000), &[0.0, 0.005], &[220.0])
            .unwrap_err();
        assert!(matches!(err, RetouchError::EstimationFailure { .. }));
    }

    #[test]
    fn test_synthesis_rejects_shape_mismatch() {
        let envelope = SpectralFrameBuffer::new(2, 513).unwrap();
        let aperiodicity = SpectralFrameBuffer::new(2, 257).unwrap();
        let err = ReferenceVocoder::new()
            .synthesize(SynthesisRequest {
                f0: &[100.0, 100.0],
                envelope: &envelope,
                aperiodicity: &aperiodicity,
                fft_size: 1024,
                frame_period_ms: 5.0,
                sample_rate: 16_000,
                output_len: 100,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RetouchError::EstimationFailure {
                stage: "synthesize",
                ..
            }
        ));
    }

    #[test]
    fn test_analysis_shapes_agree() {
        let vocoder = ReferenceVocoder::new();
        let samples = sine(220.0, 3_200);
        let signal = Signal::new(&samples, 16_000);

        let contour = vocoder.estimate_f0(signal, &options()).unwrap();
        let frames = vocoder.frame_count(F0Estimator::Fast, 16_000, samples.len(), 5.0);
        assert_eq!(contour.len(), frames);

        let refined = vocoder.refine_f0(signal, &contour).unwrap();
        assert_eq!(refined.len(), frames);

        let estimate = vocoder
            .estimate_envelope(signal, &contour.time_markers, &refined)
            .unwrap();
        let aperiodicity = vocoder
            .estimate_aperiodicity(signal, &contour.time_markers, &refined, estimate.fft_size)
            .unwrap();
        assert_eq!(estimate.envelope.shape(), aperiodicity.shape());
        assert_eq!(estimate.envelope.shape(), (frames, estimate.fft_size / 2 + 1));
    }
}
