//! Report types describing a completed retouch run.

use serde::{Deserialize, Serialize};

use crate::params::F0Estimator;

/// Timing information for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Name of the stage (e.g., "estimate_f0", "synthesize").
    pub stage: String,
    /// Duration of this stage in milliseconds.
    pub duration_ms: u64,
}

impl StageTiming {
    /// Creates a new stage timing entry.
    ///
    /// # Example
    /// ```
    /// use retouch_spec::StageTiming;
    ///
    /// let timing = StageTiming::new("estimate_f0", 42);
    /// assert_eq!(timing.stage, "estimate_f0");
    /// assert_eq!(timing.duration_ms, 42);
    /// ```
    pub fn new(stage: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            stage: stage.into(),
            duration_ms,
        }
    }
}

/// Summary of a successful retouch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetouchReport {
    /// Estimator used for the F0 stage.
    pub estimator: F0Estimator,
    /// Number of analysis frames.
    pub frame_count: usize,
    /// FFT size used by the spectral analysis.
    pub fft_size: usize,
    /// Number of frames with a non-zero refined F0.
    pub voiced_frames: usize,
    /// Number of output samples written.
    pub sample_count: usize,
    /// Hex-encoded BLAKE3 hash of the output samples.
    pub output_hash: String,
    /// Per-stage timings in execution order.
    pub stages: Vec<StageTiming>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
}

impl RetouchReport {
    /// Serializes the report to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Fraction of frames that were voiced.
    pub fn voiced_ratio(&self) -> f64 {
        if self.frame_count == 0 {
            0.0
        } else {
            self.voiced_frames as f64 / self.frame_count as f64
        }
    }
}
