//! Formant shifting by frequency-axis warping of the spectral envelope.
//!
//! A shift of `s` semitones resamples every envelope row so that output bin
//! `i` reads the input at bin `i / 2^(s/12)`. Positive shifts compress the
//! source axis and raise the formants; negative shifts lower them. F0 is
//! handled separately, so pitch is unaffected.

use retouch_spec::semitones_to_rate;

use crate::error::{RetouchError, RetouchResult};
use crate::frame_buffer::SpectralFrameBuffer;

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Where an output bin samples the source row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcePosition {
    /// Left source bin.
    pub left: usize,
    /// Right source bin; equals `bin_count` when sampling the last bin.
    pub right: usize,
    /// Interpolation weight of `right`, in `[0, 1)`.
    pub frac: f64,
}

/// Formant warper for a fixed shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantWarper {
    rate: f64,
}

impl FormantWarper {
    /// Creates a warper shifting formants by `semitones`.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `semitones` is not finite.
    pub fn new(semitones: f64) -> RetouchResult<Self> {
        if !semitones.is_finite() {
            return Err(RetouchError::invalid_param(
                "formant_shift_semitones",
                format!("must be finite, got {}", semitones),
            ));
        }
        Ok(Self {
            rate: semitones_to_rate(semitones),
        })
    }

    /// Frequency-axis scale factor `2^(semitones/12)`.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Source position sampled by output bin `bin` in a row of `bin_count` bins.
    ///
    /// The normalized position `(bin / (bin_count - 1)) / rate` is clamped to
    /// at most 1, so the sample never runs past the last bin. Evaluated as
    /// `bin / rate` in bin units, which is the same quantity without the
    /// round trip through `[0, 1]`.
    pub fn source_position(&self, bin: usize, bin_count: usize) -> SourcePosition {
        let last = bin_count.saturating_sub(1) as f64;
        let c = (bin as f64 / self.rate).min(last);
        debug_assert!(c >= 0.0, "negative source position {} for bin {}", c, bin);

        let left = c.floor() as usize;
        SourcePosition {
            left,
            right: left + 1,
            frac: c - left as f64,
        }
    }

    /// Warps every row of `input` into a newly allocated buffer.
    pub fn apply(&self, input: &SpectralFrameBuffer) -> RetouchResult<SpectralFrameBuffer> {
        let bins = input.bin_count();
        let positions: Vec<SourcePosition> = (0..bins)
            .map(|i| self.source_position(i, bins))
            .collect();

        let mut output = input.zeroed_like()?;
        for (src, dst) in input.rows().zip(output.rows_mut()) {
            for (out, pos) in dst.iter_mut().zip(&positions) {
                *out = if pos.right < bins {
                    lerp(src[pos.left], src[pos.right], pos.frac)
                } else {
                    src[pos.left]
                };
            }
        }
        Ok(output)
    }
}

/// Shifts the formants of `input` by `semitones`.
///
/// Convenience wrapper around [`FormantWarper`].
pub fn warp(input: &SpectralFrameBuffer, semitones: f64) -> RetouchResult<SpectralFrameBuffer> {
    FormantWarper::new(semitones)?.apply(input)
}
