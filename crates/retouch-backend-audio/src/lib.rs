//! Voice Retouch Backend
//!
//! This crate retouches mono voice recordings between analysis and
//! resynthesis: the signal is decomposed into an F0 contour, a spectral
//! envelope and an aperiodicity envelope, those are reshaped, and a new
//! waveform of the same length is synthesized.
//!
//! # Overview
//!
//! Three independent controls act on the decomposition:
//!
//! - **Pitch** - the F0 contour is transposed by a number of semitones and
//!   optionally pulled toward the equal-tempered grid
//! - **Formants** - the frequency axis of the envelope is warped, which moves
//!   vocal-tract resonances without changing pitch
//! - **Breathiness** - the aperiodicity envelope is raised to a
//!   frequency-dependent exponent, adding or removing noise above a few
//!   hundred hertz
//!
//! Analysis and synthesis are delegated to a [`Vocoder`]. The crate ships
//! [`ReferenceVocoder`], an FFT-based implementation built on `rustfft`.
//!
//! # Determinism
//!
//! Analysis is deterministic. The only randomness is the noise excitation used
//! in synthesis, drawn from PCG32 with a seed derived via BLAKE3, so the same
//! input, parameters and seed always produce identical output.
//!
//! # Example
//!
//! ```
//! use retouch_backend_audio::retouch;
//! use retouch_spec::RetouchParams;
//!
//! let mut samples: Vec<f64> = (0..3200)
//!     .map(|n| 0.5 * (2.0 * std::f64::consts::PI * 220.0 * n as f64 / 16000.0).sin())
//!     .collect();
//! let params = RetouchParams::builder().pitch_shift(12.0).build();
//!
//! let report = retouch(&mut samples, 16000, &params).unwrap();
//! assert_eq!(report.sample_count, 3200);
//! ```
//!
//! # Crate Structure
//!
//! - [`retouch()`] - Retouch a buffer in place with the reference vocoder
//! - [`pipeline`] - The staged retouch pipeline over any [`Vocoder`]
//! - [`formant`] - Envelope frequency-axis warping
//! - [`noise`] - Breathiness retouching of aperiodicity
//! - [`pitch`] - F0 transposition and semitone correction
//! - [`frame_buffer`] - Contiguous per-frame spectral storage
//! - [`vocoder`] - Analysis/synthesis trait and reference implementation
//! - [`rng`] - Deterministic RNG with seed derivation
//! - [`wav`] - WAV file reading and writing

pub mod error;
pub mod formant;
pub mod frame_buffer;
pub mod noise;
pub mod pipeline;
pub mod pitch;
pub mod rng;
pub mod vocoder;
pub mod wav;

// Re-export main types at crate root
pub use error::{RetouchError, RetouchResult};
pub use formant::{warp, FormantWarper, SourcePosition};
pub use frame_buffer::SpectralFrameBuffer;
pub use noise::NoiseRetoucher;
pub use pipeline::{hash_samples, retouch, RetouchPipeline};
pub use vocoder::{
    EnvelopeEstimate, F0Contour, F0Options, ReferenceVocoder, Signal, SynthesisRequest, Vocoder,
    DEFAULT_NOISE_SEED,
};
pub use wav::{read_mono, retouch_wav_file, write_mono};
