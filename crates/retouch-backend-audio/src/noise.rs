//! Breathiness retouching of the aperiodicity envelope.
//!
//! Each aperiodicity ratio `a` in `[0, 1]` is raised to an exponent that ramps
//! from 1 at DC to `1 - level` once the normalized frequency reaches
//! `1 / (width * 100)`. Positive levels push the upper spectrum toward full
//! aperiodicity (breathier), negative levels pull it toward zero.

use crate::formant::lerp;
use crate::frame_buffer::SpectralFrameBuffer;

/// Breathiness retoucher with a fixed ramp width and strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseRetoucher {
    width: f64,
    level: f64,
}

impl NoiseRetoucher {
    /// Creates a retoucher.
    ///
    /// `level` is clamped to `[-1, 1]`, which keeps the exponent in `[0, 2]`.
    /// A non-finite level or width counts as 0, which leaves ratios unchanged.
    pub fn new(width: f64, level: f64) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            width: finite_or_zero(width),
            level: finite_or_zero(level).clamp(-1.0, 1.0),
        }
    }

    /// Ramp width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Effective (clamped) strength.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Exponent applied to bin `bin` of a row with `bin_count` bins.
    pub fn exponent(&self, bin: usize, bin_count: usize) -> f64 {
        let position = if bin_count > 1 {
            bin as f64 / (bin_count - 1) as f64
        } else {
            0.0
        };
        let t = (position * self.width * 100.0).clamp(0.0, 1.0);
        lerp(1.0, 1.0 - self.level, t)
    }

    /// Reshapes every row of `buffer` in place.
    pub fn apply(&self, buffer: &mut SpectralFrameBuffer) {
        if self.level == 0.0 {
            return;
        }
        let bins = buffer.bin_count();
        let exponents: Vec<f64> = (0..bins).map(|i| self.exponent(i, bins)).collect();
        for row in buffer.rows_mut() {
            for (value, &e) in row.iter_mut().zip(&exponents) {
                *value = reshape(*value, e);
            }
        }
    }
}

/// Raises an aperiodicity ratio to `exponent`; zero stays zero.
#[inline]
fn reshape(value: f64, exponent: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else {
        value.powf(exponent)
    }
}

/// Reshapes `buffer` in place with the given ramp width and strength.
pub fn retouch(buffer: &mut SpectralFrameBuffer, width: f64, level: f64) {
    NoiseRetoucher::new(width, level).apply(buffer);
}
