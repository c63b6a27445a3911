//! WAV file reading and writing for whole-file retouching.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::info;
use retouch_spec::{RetouchParams, RetouchReport};

use crate::error::{RetouchError, RetouchResult};
use crate::pipeline::retouch;

/// Reads a WAV file as mono `f64` samples in `[-1, 1]`.
///
/// Integer PCM of 8 to 32 bits and 32-bit float files are accepted.
/// Multi-channel files are mixed down by averaging the channels of each frame.
///
/// # Returns
/// `(samples, sample_rate)`
///
/// # Errors
/// * `Io` if the file cannot be opened
/// * `Wav` if it is not a readable WAV file
pub fn read_mono(path: impl AsRef<Path>) -> RetouchResult<(Vec<f64>, u32)> {
    let file = File::open(path.as_ref())?;
    let reader = hound::WavReader::new(BufReader::new(file))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(RetouchError::invalid_param(
            "channels",
            "WAV file declares zero channels",
        ));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
    };

    Ok((mix_to_mono(&interleaved, spec.channels), spec.sample_rate))
}

fn mix_to_mono(interleaved: &[f64], channels: u16) -> Vec<f64> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// Writes mono samples as 16-bit PCM, clipping to `[-1, 1]`.
///
/// # Errors
/// * `Io` if the file cannot be created
/// * `Wav` if encoding fails
pub fn write_mono(path: impl AsRef<Path>, samples: &[f64], sample_rate: u32) -> RetouchResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let file = File::create(path.as_ref())?;
    let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)?;
    for &sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

#[inline]
fn to_pcm16(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Reads `input`, retouches it with the reference vocoder, and writes the
/// result to `output` at the input's sample rate.
///
/// Nothing is written if reading or retouching fails.
pub fn retouch_wav_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    params: &RetouchParams,
) -> RetouchResult<RetouchReport> {
    let input = input.as_ref();
    let output = output.as_ref();

    let (mut samples, sample_rate) = read_mono(input)?;
    info!(
        "read {} samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        input.display()
    );

    let report = retouch(&mut samples, sample_rate, params)?;
    write_mono(output, &samples, sample_rate)?;
    info!("wrote {}", output.display());
    Ok(report)
}
