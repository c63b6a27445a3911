//! F0 estimation and refinement.
//!
//! Both estimators run a cumulative-mean-normalized difference detector on a
//! segment centered at every frame time. The precise variant integrates over
//! twice as many samples, uses a stricter voicing threshold, and cleans the
//! contour afterwards. The lag search never goes below
//! [`MIN_DETECTABLE_F0`], whatever the requested floor.

use std::f64::consts::PI;

use retouch_spec::{F0Estimator, MIN_DETECTABLE_F0};

use super::dsp::{centered_segment, hann_window, parabolic_offset, time_to_sample};
use super::{F0Contour, F0Options, Signal};
use crate::error::RetouchResult;
use crate::frame_buffer::reserve_frames;

/// Detector settings for one estimator variant.
#[derive(Debug, Clone, Copy)]
struct DetectorConfig {
    /// Integration window, in periods of the F0 floor.
    window_floor_periods: usize,
    /// Normalized difference below which a lag counts as periodic.
    threshold: f64,
}

impl DetectorConfig {
    fn for_estimator(estimator: F0Estimator) -> Self {
        match estimator {
            F0Estimator::Fast => Self {
                window_floor_periods: 1,
                threshold: 0.2,
            },
            F0Estimator::Precise => Self {
                window_floor_periods: 2,
                threshold: 0.15,
            },
        }
    }
}

/// Voiced runs shorter than this are dropped by the precise estimator.
const MIN_VOICED_RUN: usize = 3;

/// Periods of the current estimate covered by the refinement window.
const REFINE_PERIODS: f64 = 4.0;

/// Relative step of the refinement search grid.
const REFINE_STEP: f64 = 0.002;

/// Grid points on each side of the raw estimate (±3%).
const REFINE_HALF_SPAN: i32 = 15;

/// Number of frames covering `sample_count` samples.
pub(crate) fn frame_count(sample_rate: u32, sample_count: usize, frame_period_ms: f64) -> usize {
    let frames = 1000.0 * sample_count as f64 / sample_rate as f64 / frame_period_ms;
    (frames as usize).saturating_add(1)
}

/// Frame times in seconds.
pub(crate) fn time_markers(frame_count: usize, frame_period_ms: f64) -> RetouchResult<Vec<f64>> {
    let mut markers = reserve_frames(frame_count)?;
    markers.extend((0..frame_count).map(|i| i as f64 * frame_period_ms / 1000.0));
    Ok(markers)
}

/// Estimates the raw contour for every frame.
pub(crate) fn estimate(signal: Signal<'_>, options: &F0Options) -> RetouchResult<F0Contour> {
    let count = frame_count(signal.sample_rate, signal.len(), options.frame_period_ms);
    let markers = time_markers(count, options.frame_period_ms)?;
    let config = DetectorConfig::for_estimator(options.estimator);

    let fs = signal.sample_rate as f64;
    let search_floor = options.f0_floor.max(MIN_DETECTABLE_F0);
    let min_lag = ((fs / options.f0_ceil).floor() as usize).max(2);
    let max_lag = ((fs / search_floor).ceil() as usize).max(min_lag + 2);
    let window = max_lag * config.window_floor_periods;

    let mut f0 = reserve_frames(count)?;
    f0.extend(markers.iter().map(|&t| {
        let center = time_to_sample(t, signal.sample_rate);
        let segment = centered_segment(signal.samples, center, window + max_lag + 1);
        detect_period(&segment, window, min_lag, max_lag, config.threshold)
            .map(|lag| fs / lag)
            .filter(|hz| (options.f0_floor..=options.f0_ceil).contains(hz))
            .unwrap_or(0.0)
    }));

    if options.estimator == F0Estimator::Precise {
        remove_short_runs(&mut f0, MIN_VOICED_RUN);
        median_smooth(&mut f0);
    }

    Ok(F0Contour {
        time_markers: markers,
        f0,
    })
}

/// Fractional period in samples, or `None` when the segment is aperiodic.
fn detect_period(
    segment: &[f64],
    window: usize,
    min_lag: usize,
    max_lag: usize,
    threshold: f64,
) -> Option<f64> {
    let energy: f64 = segment[..window].iter().map(|x| x * x).sum();
    if energy <= f64::EPSILON {
        return None;
    }

    // Cumulative-mean-normalized difference, index = lag.
    // The segment holds `window + max_lag + 1` samples.
    let mut cmnd = vec![1.0; max_lag + 2];
    let mut running = 0.0;
    for lag in 1..=max_lag + 1 {
        let diff: f64 = segment[..window]
            .iter()
            .zip(&segment[lag..lag + window])
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        running += diff;
        cmnd[lag] = if running > 0.0 {
            diff * lag as f64 / running
        } else {
            1.0
        };
    }

    let mut lag = (min_lag..=max_lag).find(|&l| cmnd[l] < threshold)?;
    while lag < max_lag && cmnd[lag + 1] < cmnd[lag] {
        lag += 1;
    }

    let offset = parabolic_offset(cmnd[lag - 1], cmnd[lag], cmnd[lag + 1]);
    Some(lag as f64 + offset)
}

/// Clears voiced runs shorter than `min_len` frames.
fn remove_short_runs(f0: &mut [f64], min_len: usize) {
    let mut start = 0;
    while start < f0.len() {
        if f0[start] <= 0.0 {
            start += 1;
            continue;
        }
        let end = (start..f0.len()).find(|&i| f0[i] <= 0.0).unwrap_or(f0.len());
        if end - start < min_len {
            f0[start..end].fill(0.0);
        }
        start = end;
    }
}

/// Three-point median over frames whose neighbours are both voiced.
fn median_smooth(f0: &mut [f64]) {
    if f0.len() < 3 {
        return;
    }
    let source = f0.to_vec();
    for i in 1..source.len() - 1 {
        let (a, b, c) = (source[i - 1], source[i], source[i + 1]);
        if a > 0.0 && b > 0.0 && c > 0.0 {
            f0[i] = a.max(b).min(a.min(b).max(c));
        }
    }
}

/// Refines every voiced frame to the nearby peak of the windowed spectrum.
pub(crate) fn refine(signal: Signal<'_>, contour: &F0Contour) -> RetouchResult<Vec<f64>> {
    let mut refined = reserve_frames(contour.f0.len())?;
    refined.extend(contour.time_markers.iter().zip(&contour.f0).map(|(&t, &f0)| {
        if f0 <= 0.0 {
            return 0.0;
        }
        refine_frame(signal, t, f0).unwrap_or(f0)
    }));
    Ok(refined)
}

fn refine_frame(signal: Signal<'_>, time: f64, f0: f64) -> Option<f64> {
    let fs = signal.sample_rate as f64;
    let len = ((REFINE_PERIODS * fs / f0).round() as usize).max(8);
    let center = time_to_sample(time, signal.sample_rate);
    let window = hann_window(len);
    let frame: Vec<f64> = centered_segment(signal.samples, center, len)
        .iter()
        .zip(&window)
        .map(|(x, w)| x * w)
        .collect();

    let magnitude = |freq: f64| -> f64 {
        let omega = 2.0 * PI * freq / fs;
        let (re, im) = frame
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(re, im), (n, &x)| {
                let phase = omega * n as f64;
                (re + x * phase.cos(), im - x * phase.sin())
            });
        re * re + im * im
    };

    let grid: Vec<f64> = (-REFINE_HALF_SPAN..=REFINE_HALF_SPAN)
        .map(|k| magnitude(f0 * (1.0 + REFINE_STEP * k as f64)))
        .collect();

    let (best, &peak) = grid
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    if peak <= 0.0 || best == 0 || best == grid.len() - 1 {
        return None;
    }

    let offset = parabolic_offset(grid[best - 1], grid[best], grid[best + 1]);
    let k = best as f64 - REFINE_HALF_SPAN as f64 + offset;
    Some(f0 * (1.0 + REFINE_STEP * k))
}
