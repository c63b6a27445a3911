//! Analysis/synthesis collaborator interface.
//!
//! The retouch pipeline does not analyse or synthesize audio itself. It calls
//! a [`Vocoder`], which supplies frame sizing, F0 estimation and refinement,
//! spectral envelope and aperiodicity estimation, and resynthesis. Any
//! analysis library can be plugged in by implementing the trait;
//! [`ReferenceVocoder`] is the implementation shipped with this crate.

mod aperiodicity;
pub mod dsp;
mod envelope;
mod f0;
mod reference;
mod synthesis;

pub use reference::{ReferenceVocoder, DEFAULT_NOISE_SEED};

use retouch_spec::F0Estimator;

use crate::error::RetouchResult;
use crate::frame_buffer::SpectralFrameBuffer;

/// A borrowed mono signal with its sample rate.
#[derive(Debug, Clone, Copy)]
pub struct Signal<'a> {
    /// Samples, nominally in `[-1, 1]`.
    pub samples: &'a [f64],
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl<'a> Signal<'a> {
    /// Wraps a sample slice.
    pub fn new(samples: &'a [f64], sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the signal has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Options for the F0 estimation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F0Options {
    /// Estimator variant.
    pub estimator: F0Estimator,
    /// Lower search bound in Hz.
    pub f0_floor: f64,
    /// Upper search bound in Hz.
    pub f0_ceil: f64,
    /// Frame period in milliseconds.
    pub frame_period_ms: f64,
}

/// Raw F0 contour with the analysis time of each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct F0Contour {
    /// Frame times in seconds.
    pub time_markers: Vec<f64>,
    /// F0 per frame in Hz, `0.0` for unvoiced frames.
    pub f0: Vec<f64>,
}

impl F0Contour {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    /// Returns true if the contour has no frames.
    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }
}

/// Spectral envelope together with the FFT size it was computed with.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeEstimate {
    /// `frame_count x (fft_size / 2 + 1)` power densities.
    pub envelope: SpectralFrameBuffer,
    /// FFT size of the analysis.
    pub fft_size: usize,
}

/// Inputs for resynthesis.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    /// F0 per frame in Hz.
    pub f0: &'a [f64],
    /// Spectral envelope, one row per frame.
    pub envelope: &'a SpectralFrameBuffer,
    /// Aperiodicity, one row per frame.
    pub aperiodicity: &'a SpectralFrameBuffer,
    /// FFT size the envelopes were computed with.
    pub fft_size: usize,
    /// Frame period in milliseconds.
    pub frame_period_ms: f64,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Number of samples to produce.
    pub output_len: usize,
}

/// Analysis and synthesis entry points consumed by the retouch pipeline.
pub trait Vocoder {
    /// Number of analysis frames for a signal, for the given estimator.
    fn frame_count(
        &self,
        estimator: F0Estimator,
        sample_rate: u32,
        sample_count: usize,
        frame_period_ms: f64,
    ) -> usize;

    /// Estimates the raw F0 contour and frame times.
    fn estimate_f0(&self, signal: Signal<'_>, options: &F0Options) -> RetouchResult<F0Contour>;

    /// Refines a raw contour; returns one value per frame.
    fn refine_f0(&self, signal: Signal<'_>, contour: &F0Contour) -> RetouchResult<Vec<f64>>;

    /// Estimates the spectral envelope from the refined F0.
    fn estimate_envelope(
        &self,
        signal: Signal<'_>,
        time_markers: &[f64],
        f0: &[f64],
    ) -> RetouchResult<EnvelopeEstimate>;

    /// Estimates the aperiodicity envelope from the refined F0.
    fn estimate_aperiodicity(
        &self,
        signal: Signal<'_>,
        time_markers: &[f64],
        f0: &[f64],
        fft_size: usize,
    ) -> RetouchResult<SpectralFrameBuffer>;

    /// Resynthesizes a waveform of `request.output_len` samples.
    fn synthesize(&self, request: SynthesisRequest<'_>) -> RetouchResult<Vec<f64>>;
}
