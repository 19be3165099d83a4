//! PCM normalization pipeline.
//!
//! Converts any supported [`AudioBuffer`] into the canonical transcription
//! input: mono, signed 16-bit, [`TARGET_SAMPLE_RATE`] Hz. Stages are
//! whole-buffer transforms over owned data:
//! - amplitude normalization into `f32` in [-1.0, 1.0]
//! - downmix to mono by per-frame averaging
//! - rational polyphase resampling (only when the rate differs)
//! - requantization to little-endian `i16`

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::buffer::{AudioBuffer, SampleFormat};
use crate::error::{Error, Result};

/// Canonical mono sample rate (Hz) expected by transcription backends.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Source frames fed to rubato per `process()` call.
const RESAMPLE_BLOCK_FRAMES: usize = 1024;

/// True when `buffer` already matches the canonical output shape, so the
/// normalizer can be skipped without touching a byte.
pub fn needs_normalization(buffer: &AudioBuffer, target_rate: u32) -> bool {
    buffer.format() != SampleFormat::Int16
        || buffer.channels() != 1
        || buffer.sample_rate() != target_rate
}

/// Run the full normalization pipeline.
pub fn normalize(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    let floats = to_normalized_f32(buffer);
    let mono = downmix_to_mono(&floats, buffer.channels() as usize);
    let resampled = resample(&mono, buffer.sample_rate(), target_rate)?;
    AudioBuffer::new(
        quantize_to_i16(&resampled),
        1,
        SampleFormat::Int16,
        target_rate,
    )
}

/// Elementwise conversion into `f32` in [-1.0, 1.0]. Order-preserving.
///
/// Integer formats divide by their maximum positive magnitude; unsigned
/// 8-bit is first recentered around its zero offset of 128. Float samples
/// pass through unchanged.
fn to_normalized_f32(buffer: &AudioBuffer) -> Vec<f32> {
    let data = buffer.data();
    match buffer.format() {
        SampleFormat::Uint8 => data
            .iter()
            .map(|&sample| (sample as f32 - 128.0) / i8::MAX as f32)
            .collect(),
        SampleFormat::Int16 => data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
            .collect(),
        SampleFormat::Int32 => data
            .chunks_exact(4)
            .map(|b| {
                // f32 has 24 mantissa bits; go through f64 so full-scale
                // i32 samples keep their relative precision.
                (i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64 / i32::MAX as f64) as f32
            })
            .collect(),
        SampleFormat::Float32 => data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    }
}

/// Downmix interleaved samples into mono by averaging channels.
///
/// Policy: equal-weight average across channels, so channel order cannot
/// affect the result.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Rational-factor resample of a mono signal.
///
/// The 1:1 case (and an empty signal) is a plain copy; the filter never
/// touches it. Otherwise the output length is exactly
/// `round(input_len * up / down)` for `up = target/g`, `down = source/g`.
pub(crate) fn resample(mono: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>> {
    if src_rate == dst_rate || mono.is_empty() {
        return Ok(mono.to_vec());
    }

    let g = gcd(src_rate, dst_rate);
    let (up, down) = ((dst_rate / g) as u64, (src_rate / g) as u64);
    let expected = ((mono.len() as u64 * up) + down / 2) / down;
    debug!(
        src_rate,
        dst_rate,
        up,
        down,
        frames_in = mono.len(),
        frames_out = expected,
        "resampling"
    );

    let mut resampler = SincFixedIn::<f32>::new(
        dst_rate as f64 / src_rate as f64,
        2.0,
        SincInterpolationParameters {
            sinc_len: 256,
            // Relative to the Nyquist frequency of the lower of the two
            // rates, which keeps aliasing out in both directions.
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        },
        RESAMPLE_BLOCK_FRAMES,
        1, // mono
    )
    .map_err(|e| Error::Resample(format!("cannot resample {src_rate} Hz to {dst_rate} Hz: {e}")))?;

    // The sinc filter is causal: its first `delay` output frames are
    // transient. Keep feeding fixed-size blocks, zero-padded past
    // end-of-input, until the useful region is fully covered, then cut
    // that region out.
    let delay = resampler.output_delay();
    let needed = delay + expected as usize;
    let mut out: Vec<f32> = Vec::with_capacity(needed + RESAMPLE_BLOCK_FRAMES);
    let mut block = vec![vec![0.0f32; RESAMPLE_BLOCK_FRAMES]];
    let mut pos = 0usize;

    while out.len() < needed {
        let take = RESAMPLE_BLOCK_FRAMES.min(mono.len().saturating_sub(pos));
        block[0][..take].copy_from_slice(&mono[pos..pos + take]);
        block[0][take..].fill(0.0);
        pos += take;

        let produced = resampler
            .process(&block, None)
            .map_err(|e| Error::Resample(e.to_string()))?;
        out.extend_from_slice(&produced[0]);
    }

    Ok(out[delay..needed].to_vec())
}

/// Clamp to [-1.0, 1.0] and quantize to little-endian `i16`.
///
/// Rounding rule: half away from zero (`f32::round`), applied consistently
/// wherever this crate quantizes samples. Clamping first means overdriven
/// input saturates instead of wrapping.
fn quantize_to_i16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        out.extend_from_slice(&quantized.to_le_bytes());
    }
    out
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
