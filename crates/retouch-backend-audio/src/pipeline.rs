//! The retouch pipeline.
//!
//! A run is a strict sequence of states. Each transition consumes the buffers
//! of the previous state and produces the next one, so intermediate data that
//! is no longer needed is dropped as soon as a stage completes, and a failure
//! at any point simply drops whatever has been allocated. The caller's buffer
//! is only written in the final transition.

use std::time::Instant;

use log::{debug, info, warn};
use retouch_spec::{
    validate_params, RetouchParams, RetouchReport, StageTiming, ValidationError,
    BREATHINESS_WIDTH,
};

use crate::error::{RetouchError, RetouchResult};
use crate::formant::FormantWarper;
use crate::frame_buffer::{reserve_frames, SpectralFrameBuffer};
use crate::noise::NoiseRetoucher;
use crate::pitch::{correct_pitch, shift_f0, voiced_count};
use crate::vocoder::{
    EnvelopeEstimate, F0Contour, F0Options, ReferenceVocoder, Signal, SynthesisRequest, Vocoder,
};

/// Pipeline state between stages.
enum PipelineState {
    Init,
    F0Estimated {
        contour: F0Contour,
    },
    F0Refined {
        time_markers: Vec<f64>,
        f0: Vec<f64>,
    },
    EnvelopeEstimated {
        time_markers: Vec<f64>,
        f0: Vec<f64>,
        envelope: SpectralFrameBuffer,
    },
    AperiodicityEstimated {
        f0: Vec<f64>,
        envelope: SpectralFrameBuffer,
        aperiodicity: SpectralFrameBuffer,
    },
    Retouched {
        f0: Vec<f64>,
        envelope: SpectralFrameBuffer,
        aperiodicity: SpectralFrameBuffer,
    },
    Synthesized {
        output: Vec<f64>,
    },
    Done,
}

impl PipelineState {
    /// Name of the stage that leaves this state.
    fn next_stage(&self) -> &'static str {
        match self {
            PipelineState::Init => "estimate_f0",
            PipelineState::F0Estimated { .. } => "refine_f0",
            PipelineState::F0Refined { .. } => "estimate_envelope",
            PipelineState::EnvelopeEstimated { .. } => "estimate_aperiodicity",
            PipelineState::AperiodicityEstimated { .. } => "retouch",
            PipelineState::Retouched { .. } => "synthesize",
            PipelineState::Synthesized { .. } => "write_output",
            PipelineState::Done => "done",
        }
    }
}

/// Per-run bookkeeping that ends up in the report.
#[derive(Debug, Default)]
struct RunStats {
    frame_count: usize,
    fft_size: usize,
    voiced_frames: usize,
    stages: Vec<StageTiming>,
}

/// Retouches a signal through a [`Vocoder`].
///
/// The pipeline borrows its vocoder and owns a copy of the parameters. It
/// holds no per-run state, so one pipeline can process any number of signals.
///
/// # Example
/// ```
/// use retouch_backend_audio::{ReferenceVocoder, RetouchPipeline};
/// use retouch_spec::RetouchParams;
///
/// let vocoder = ReferenceVocoder::new();
/// let params = RetouchParams::builder().pitch_shift(2.0).build();
/// let mut samples: Vec<f64> = (0..1600)
///     .map(|n| 0.5 * (2.0 * std::f64::consts::PI * 220.0 * n as f64 / 16000.0).sin())
///     .collect();
///
/// let report = RetouchPipeline::new(&vocoder, &params)
///     .run(&mut samples, 16000)
///     .unwrap();
/// assert_eq!(report.sample_count, 1600);
/// ```
pub struct RetouchPipeline<'v, V: Vocoder + ?Sized> {
    vocoder: &'v V,
    params: RetouchParams,
}

impl<'v, V: Vocoder + ?Sized> RetouchPipeline<'v, V> {
    /// Creates a pipeline.
    pub fn new(vocoder: &'v V, params: &RetouchParams) -> Self {
        Self {
            vocoder,
            params: params.clone(),
        }
    }

    /// Parameters used by this pipeline.
    pub fn params(&self) -> &RetouchParams {
        &self.params
    }

    /// Retouches `samples` in place.
    ///
    /// On success `samples` holds the resynthesized signal, same length as
    /// the input. On failure `samples` is left untouched.
    ///
    /// # Errors
    /// * `InvalidParameter` if validation fails; the vocoder is not called
    /// * `EstimationFailure` if a stage fails or returns inconsistent data
    /// * `AllocationFailure` if the per-frame vectors or a frame buffer cannot
    ///   be allocated; the vocoder is not called when the frame count alone
    ///   is too large
    pub fn run(&self, samples: &mut [f64], sample_rate: u32) -> RetouchResult<RetouchReport> {
        let started = Instant::now();
        self.validate(sample_rate, samples.len())?;

        let mut stats = RunStats {
            frame_count: self.vocoder.frame_count(
                self.params.estimator,
                sample_rate,
                samples.len(),
                self.params.frame_period_ms,
            ),
            ..RunStats::default()
        };
        if stats.frame_count == 0 {
            return Err(RetouchError::estimation(
                "frame_count",
                "vocoder reported zero analysis frames",
            ));
        }
        // Every stage holds at least a contour and its time markers.
        let frame_vectors = (
            reserve_frames(stats.frame_count)?,
            reserve_frames(stats.frame_count)?,
        );
        drop(frame_vectors);

        let mut state = PipelineState::Init;
        loop {
            let stage = state.next_stage();
            let stage_started = Instant::now();
            let signal = Signal::new(&*samples, sample_rate);

            state = match state {
                PipelineState::Init => self.estimate_f0(signal, &mut stats)?,
                PipelineState::F0Estimated { contour } => {
                    self.refine_f0(signal, contour, &mut stats)?
                }
                PipelineState::F0Refined { time_markers, f0 } => {
                    self.estimate_envelope(signal, time_markers, f0, &mut stats)?
                }
                PipelineState::EnvelopeEstimated {
                    time_markers,
                    f0,
                    envelope,
                } => self.estimate_aperiodicity(signal, &time_markers, f0, envelope, &stats)?,
                PipelineState::AperiodicityEstimated {
                    f0,
                    envelope,
                    aperiodicity,
                } => self.retouch(f0, envelope, aperiodicity)?,
                PipelineState::Retouched {
                    f0,
                    envelope,
                    aperiodicity,
                } => self.synthesize(signal, &f0, &envelope, &aperiodicity, &stats)?,
                PipelineState::Synthesized { output } => {
                    samples.copy_from_slice(&output);
                    info!("done");
                    PipelineState::Done
                }
                PipelineState::Done => break,
            };

            stats.stages.push(StageTiming::new(
                stage,
                stage_started.elapsed().as_millis() as u64,
            ));
        }

        Ok(RetouchReport {
            estimator: self.params.estimator,
            frame_count: stats.frame_count,
            fft_size: stats.fft_size,
            voiced_frames: stats.voiced_frames,
            sample_count: samples.len(),
            output_hash: hash_samples(samples),
            stages: stats.stages,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn validate(&self, sample_rate: u32, sample_count: usize) -> RetouchResult<()> {
        let warnings = validate_params(&self.params, sample_rate, sample_count)
            .into_result()
            .map_err(first_error)?;
        for warning in warnings {
            warn!("{}", warning);
        }
        Ok(())
    }

    fn estimate_f0(
        &self,
        signal: Signal<'_>,
        stats: &mut RunStats,
    ) -> RetouchResult<PipelineState> {
        info!("estimating f0");
        let options = F0Options {
            estimator: self.params.estimator,
            f0_floor: self.params.f0_floor,
            f0_ceil: self.params.f0_ceil,
            frame_period_ms: self.params.frame_period_ms,
        };
        let contour = self.vocoder.estimate_f0(signal, &options)?;
        if contour.f0.len() != stats.frame_count
            || contour.time_markers.len() != stats.frame_count
        {
            return Err(RetouchError::estimation(
                "estimate_f0",
                format!(
                    "expected {} frames, got {} f0 values and {} time markers",
                    stats.frame_count,
                    contour.f0.len(),
                    contour.time_markers.len()
                ),
            ));
        }
        debug!(
            "{} estimator produced {} frames",
            options.estimator.as_str(),
            stats.frame_count
        );
        Ok(PipelineState::F0Estimated { contour })
    }

    fn refine_f0(
        &self,
        signal: Signal<'_>,
        contour: F0Contour,
        stats: &mut RunStats,
    ) -> RetouchResult<PipelineState> {
        info!("refining f0");
        let f0 = self.vocoder.refine_f0(signal, &contour)?;
        if f0.len() != stats.frame_count {
            return Err(RetouchError::estimation(
                "refine_f0",
                format!("expected {} frames, got {}", stats.frame_count, f0.len()),
            ));
        }
        stats.voiced_frames = voiced_count(&f0);
        debug!(
            "{} of {} frames voiced",
            stats.voiced_frames, stats.frame_count
        );
        Ok(PipelineState::F0Refined {
            time_markers: contour.time_markers,
            f0,
        })
    }

    fn estimate_envelope(
        &self,
        signal: Signal<'_>,
        time_markers: Vec<f64>,
        f0: Vec<f64>,
        stats: &mut RunStats,
    ) -> RetouchResult<PipelineState> {
        info!("estimating spectral envelope");
        let EnvelopeEstimate { envelope, fft_size } =
            self.vocoder.estimate_envelope(signal, &time_markers, &f0)?;
        let expected = (stats.frame_count, fft_size / 2 + 1);
        if fft_size == 0 || envelope.shape() != expected {
            return Err(RetouchError::estimation(
                "estimate_envelope",
                format!(
                    "expected a {}x{} envelope, got {:?}",
                    expected.0,
                    expected.1,
                    envelope.shape()
                ),
            ));
        }
        stats.fft_size = fft_size;
        debug!("fft size {}, {} bins per frame", fft_size, expected.1);
        Ok(PipelineState::EnvelopeEstimated {
            time_markers,
            f0,
            envelope,
        })
    }

    fn estimate_aperiodicity(
        &self,
        signal: Signal<'_>,
        time_markers: &[f64],
        f0: Vec<f64>,
        envelope: SpectralFrameBuffer,
        stats: &RunStats,
    ) -> RetouchResult<PipelineState> {
        info!("estimating aperiodicity");
        let aperiodicity =
            self.vocoder
                .estimate_aperiodicity(signal, time_markers, &f0, stats.fft_size)?;
        if aperiodicity.shape() != envelope.shape() {
            return Err(RetouchError::estimation(
                "estimate_aperiodicity",
                format!(
                    "aperiodicity shape {:?} does not match envelope shape {:?}",
                    aperiodicity.shape(),
                    envelope.shape()
                ),
            ));
        }
        Ok(PipelineState::AperiodicityEstimated {
            f0,
            envelope,
            aperiodicity,
        })
    }

    fn retouch(
        &self,
        mut f0: Vec<f64>,
        envelope: SpectralFrameBuffer,
        mut aperiodicity: SpectralFrameBuffer,
    ) -> RetouchResult<PipelineState> {
        info!("retouching");
        shift_f0(&mut f0, self.params.pitch_shift_semitones);

        let correction = self.params.pitch_correction_amount();
        if correction > 0.0 {
            correct_pitch(&mut f0, correction);
        }

        let warper = FormantWarper::new(self.params.formant_shift_semitones)?;
        let envelope = warper.apply(&envelope)?;

        let breathiness = NoiseRetoucher::new(BREATHINESS_WIDTH, self.params.breathiness_level());
        breathiness.apply(&mut aperiodicity);

        debug!(
            "pitch x{:.4}, formant x{:.4}, breathiness {:.2}, correction {:.2}",
            self.params.pitch_shift_rate(),
            warper.rate(),
            breathiness.level(),
            correction
        );
        Ok(PipelineState::Retouched {
            f0,
            envelope,
            aperiodicity,
        })
    }

    fn synthesize(
        &self,
        signal: Signal<'_>,
        f0: &[f64],
        envelope: &SpectralFrameBuffer,
        aperiodicity: &SpectralFrameBuffer,
        stats: &RunStats,
    ) -> RetouchResult<PipelineState> {
        info!("synthesizing");
        let output = self.vocoder.synthesize(SynthesisRequest {
            f0,
            envelope,
            aperiodicity,
            fft_size: stats.fft_size,
            frame_period_ms: self.params.frame_period_ms,
            sample_rate: signal.sample_rate,
            output_len: signal.len(),
        })?;
        if output.len() != signal.len() {
            return Err(RetouchError::estimation(
                "synthesize",
                format!(
                    "expected {} samples, got {}",
                    signal.len(),
                    output.len()
                ),
            ));
        }
        Ok(PipelineState::Synthesized { output })
    }
}

fn first_error(errors: Vec<ValidationError>) -> RetouchError {
    errors
        .into_iter()
        .next()
        .map(RetouchError::from)
        .unwrap_or_else(|| RetouchError::invalid_param("params", "validation failed"))
}

/// Retouches `samples` in place with the [`ReferenceVocoder`].
///
/// See [`RetouchPipeline::run`] for the error contract.
pub fn retouch(
    samples: &mut [f64],
    sample_rate: u32,
    params: &RetouchParams,
) -> RetouchResult<RetouchReport> {
    let vocoder = ReferenceVocoder::new();
    RetouchPipeline::new(&vocoder, params).run(samples, sample_rate)
}

/// Hex BLAKE3 hash of the little-endian bytes of `samples`.
pub fn hash_samples(samples: &[f64]) -> String {
    let mut hasher = blake3::Hasher::new();
    for sample in samples {
        hasher.update(&sample.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
