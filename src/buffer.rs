//! Typed PCM carrier handed between pipeline stages.

use serde::Serialize;

use crate::error::{Error, Result};

/// Sample encodings accepted by the pipeline.
///
/// A bare sample width is ambiguous (a 4-byte sample can be an `i32` or an
/// `f32`), so the encoding is named explicitly and the width derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// Unsigned 8-bit PCM. WAVE convention: logical zero sits at 128.
    Uint8,
    /// Signed 16-bit little-endian PCM.
    Int16,
    /// Signed 32-bit little-endian PCM.
    Int32,
    /// IEEE float32 little-endian, nominally in [-1.0, 1.0].
    Float32,
}

impl SampleFormat {
    /// Width of a single sample in bytes.
    pub fn sample_width_bytes(self) -> usize {
        match self {
            SampleFormat::Uint8 => 1,
            SampleFormat::Int16 => 2,
            SampleFormat::Int32 | SampleFormat::Float32 => 4,
        }
    }

    /// WAVE `fmt ` format tag: 1 = integer PCM, 3 = IEEE float.
    pub(crate) fn wav_format_tag(self) -> u16 {
        match self {
            SampleFormat::Float32 => 3,
            _ => 1,
        }
    }
}

/// An owned block of interleaved PCM with known format parameters.
///
/// Invariant: the payload length is always an exact multiple of
/// `channels * sample width`, so every frame index maps to a clean byte
/// offset. The constructor enforces this once; stages pass buffers by value
/// and never share mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
    data: Vec<u8>,
}

impl AudioBuffer {
    /// Wrap raw interleaved little-endian PCM bytes.
    pub fn new(
        data: Vec<u8>,
        channels: u16,
        format: SampleFormat,
        sample_rate: u32,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(Error::UnsupportedFormat(
                "channel count must be positive".into(),
            ));
        }
        if sample_rate == 0 {
            return Err(Error::UnsupportedFormat(
                "sample rate must be positive".into(),
            ));
        }

        let frame_size = channels as usize * format.sample_width_bytes();
        if data.len() % frame_size != 0 {
            return Err(Error::MalformedContainer(format!(
                "PCM payload of {} bytes is not a multiple of the {frame_size}-byte frame size",
                data.len()
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            format,
            data,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// The raw interleaved payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes per frame (one sample per channel).
    pub fn frame_size_bytes(&self) -> usize {
        self.channels as usize * self.format.sample_width_bytes()
    }

    /// Number of whole frames in the payload.
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.frame_size_bytes()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }
}
