//! Contiguous per-frame spectral storage.
//!
//! Spectral envelopes and aperiodicity envelopes are grids of
//! `frame_count x bin_count` values. The grid lives in a single allocation and
//! rows are handed out as slices, so a row can never outlive its buffer.

use crate::error::{RetouchError, RetouchResult};

/// Reserves an empty per-frame vector (one value per frame).
///
/// # Errors
/// * `AllocationFailure` if `frame_count` values cannot be reserved
pub fn reserve_frames(frame_count: usize) -> RetouchResult<Vec<f64>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(frame_count)
        .map_err(|_| RetouchError::AllocationFailure {
            frames: frame_count,
            bins: 1,
        })?;
    Ok(values)
}

/// A `frame_count x bin_count` grid of `f64` values stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrameBuffer {
    data: Vec<f64>,
    frame_count: usize,
    bin_count: usize,
}

impl SpectralFrameBuffer {
    /// Allocates a zero-filled buffer.
    ///
    /// # Errors
    /// * `InvalidParameter` if either dimension is zero
    /// * `AllocationFailure` if the grid size overflows or cannot be reserved
    pub fn new(frame_count: usize, bin_count: usize) -> RetouchResult<Self> {
        if frame_count == 0 || bin_count == 0 {
            return Err(RetouchError::invalid_param(
                "frame_buffer",
                format!(
                    "dimensions must be non-zero, got {}x{}",
                    frame_count, bin_count
                ),
            ));
        }

        let len = frame_count
            .checked_mul(bin_count)
            .ok_or(RetouchError::AllocationFailure {
                frames: frame_count,
                bins: bin_count,
            })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RetouchError::AllocationFailure {
                frames: frame_count,
                bins: bin_count,
            })?;
        data.resize(len, 0.0);

        Ok(Self {
            data,
            frame_count,
            bin_count,
        })
    }

    /// Builds a buffer from equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> RetouchResult<Self> {
        let bin_count = rows.first().map_or(0, Vec::len);
        let mut buffer = Self::new(rows.len(), bin_count)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != bin_count {
                return Err(RetouchError::invalid_param(
                    "frame_buffer",
                    format!(
                        "row {} has {} bins, expected {}",
                        i,
                        row.len(),
                        bin_count
                    ),
                ));
            }
            buffer.row_mut(i).copy_from_slice(row);
        }
        Ok(buffer)
    }

    /// Allocates a zero-filled buffer with the same shape as `self`.
    pub fn zeroed_like(&self) -> RetouchResult<Self> {
        Self::new(self.frame_count, self.bin_count)
    }

    /// Number of rows (analysis frames).
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of columns (frequency bins).
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Returns `(frame_count, bin_count)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.frame_count, self.bin_count)
    }

    /// Returns row `frame`.
    ///
    /// # Panics
    /// Panics if `frame >= frame_count`.
    pub fn row(&self, frame: usize) -> &[f64] {
        let start = frame * self.bin_count;
        &self.data[start..start + self.bin_count]
    }

    /// Returns row `frame` mutably.
    ///
    /// # Panics
    /// Panics if `frame >= frame_count`.
    pub fn row_mut(&mut self, frame: usize) -> &mut [f64] {
        let start = frame * self.bin_count;
        &mut self.data[start..start + self.bin_count]
    }

    /// Value at `(frame, bin)`, or `None` when out of range.
    pub fn get(&self, frame: usize, bin: usize) -> Option<f64> {
        if frame < self.frame_count && bin < self.bin_count {
            Some(self.data[frame * self.bin_count + bin])
        } else {
            None
        }
    }

    /// Iterates over rows in frame order.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.bin_count)
    }

    /// Iterates mutably over rows in frame order.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.bin_count)
    }

    /// The whole grid, row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The whole grid mutably, row-major.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_is_zeroed() {
        let buffer = SpectralFrameBuffer::new(3, 4).unwrap();
        assert_eq!(buffer.shape(), (3, 4));
        assert_eq!(buffer.as_slice().len(), 12);
        assert!(buffer.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            SpectralFrameBuffer::new(0, 4),
            Err(RetouchError::InvalidParameter { .. })
        ));
        assert!(matches!(
            SpectralFrameBuffer::new(4, 0),
            Err(RetouchError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_overflowing_shape_is_allocation_failure() {
        assert!(matches!(
            SpectralFrameBuffer::new(usize::MAX, 2),
            Err(RetouchError::AllocationFailure { .. })
        ));
    }

    #[test]
    fn test_rows_are_strided_views() {
        let mut buffer = SpectralFrameBuffer::new(2, 3).unwrap();
        buffer.row_mut(1).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(buffer.row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(buffer.row(1), &[1.0, 2.0, 3.0]);
        assert_eq!(buffer.get(1, 2), Some(3.0));
        assert_eq!(buffer.get(2, 0), None);
        assert_eq!(buffer.as_slice(), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rows_mut_visits_every_frame() {
        let mut buffer = SpectralFrameBuffer::new(4, 2).unwrap();
        for (i, row) in buffer.rows_mut().enumerate() {
            row.fill(i as f64);
        }
        let firsts: Vec<f64> = buffer.rows().map(|row| row[0]).collect();
        assert_eq!(firsts, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_rows() {
        let buffer = SpectralFrameBuffer::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(buffer.shape(), (2, 2));
        assert_eq!(buffer.row(1), &[3.0, 4.0]);

        let ragged = SpectralFrameBuffer::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(ragged, Err(RetouchError::InvalidParameter { .. })));
    }

    #[test]
    fn test_reserve_frames() {
        let values = reserve_frames(201).unwrap();
        assert!(values.is_empty());
        assert!(values.capacity() >= 201);

        let err = reserve_frames(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            RetouchError::AllocationFailure {
                frames: usize::MAX,
                bins: 1
            }
        ));
    }
}
