//! RIFF/WAVE container codec.
//!
//! Owns the wire format for every container this crate accepts or produces:
//! a 12-byte RIFF header, a PCM `fmt ` sub-chunk, and a `data` sub-chunk
//! carrying raw interleaved frames. Decode walks sub-chunks and skips
//! anything it does not understand; encode always emits the minimal
//! canonical layout, wrapping the payload verbatim.

use crate::buffer::{AudioBuffer, SampleFormat};
use crate::error::{Error, Result};

/// Size of the fixed header emitted by [`encode`]: RIFF header plus a
/// 16-byte `fmt ` body plus the `data` preamble.
pub const HEADER_LEN: usize = 44;

/// Parse a WAVE container and expose its PCM payload.
pub fn decode(bytes: &[u8]) -> Result<AudioBuffer> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(Error::MalformedContainer(
            "missing RIFF/WAVE markers".into(),
        ));
    }

    let declared_riff = read_u32(bytes, 4) as usize;
    if declared_riff + 8 > bytes.len() {
        return Err(Error::MalformedContainer(format!(
            "declared RIFF length {declared_riff} exceeds the {} available bytes",
            bytes.len() - 8
        )));
    }

    let mut fmt: Option<FmtChunk> = None;
    let mut data: Option<&[u8]> = None;
    let mut pos = 12usize;

    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = read_u32(bytes, pos + 4) as usize;
        let body_start = pos + 8;
        let body_end = body_start.checked_add(size).ok_or_else(|| {
            Error::MalformedContainer(format!("chunk size {size} overflows the container"))
        })?;
        if body_end > bytes.len() {
            return Err(Error::MalformedContainer(format!(
                "chunk '{}' declares {size} bytes but only {} remain",
                String::from_utf8_lossy(id),
                bytes.len() - body_start
            )));
        }

        let body = &bytes[body_start..body_end];
        match id {
            b"fmt " => fmt = Some(parse_fmt(body)?),
            b"data" => data = Some(body),
            // LIST, fact, cue, ... carry no PCM.
            _ => {}
        }

        // Sub-chunks are word-aligned; an odd size carries one pad byte.
        pos = body_end + (size & 1);
    }

    let fmt = fmt.ok_or_else(|| Error::MalformedContainer("missing fmt chunk".into()))?;
    let data = data.ok_or_else(|| Error::MalformedContainer("missing data chunk".into()))?;

    AudioBuffer::new(data.to_vec(), fmt.channels, fmt.format, fmt.sample_rate)
}

/// Build the minimal canonical container around a buffer's payload.
///
/// All size fields are computed from the payload: data length = payload
/// length, RIFF length = payload length + 36. Never fails; payload alignment
/// is the [`AudioBuffer`] constructor's invariant and is not re-checked here.
pub fn encode(buffer: &AudioBuffer) -> Vec<u8> {
    let data_len = buffer.data().len() as u32;
    let block_align = buffer.frame_size_bytes() as u16;
    let byte_rate = buffer.sample_rate() * block_align as u32;
    let bits_per_sample = (buffer.format().sample_width_bytes() * 8) as u16;

    let mut out = Vec::with_capacity(HEADER_LEN + buffer.data().len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(data_len + 36).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&buffer.format().wav_format_tag().to_le_bytes());
    out.extend_from_slice(&buffer.channels().to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(buffer.data());
    out
}

struct FmtChunk {
    channels: u16,
    sample_rate: u32,
    format: SampleFormat,
}

fn parse_fmt(body: &[u8]) -> Result<FmtChunk> {
    if body.len() < 16 {
        return Err(Error::MalformedContainer(format!(
            "fmt chunk is {} bytes, expected at least 16",
            body.len()
        )));
    }

    let format_tag = read_u16(body, 0);
    let channels = read_u16(body, 2);
    let sample_rate = read_u32(body, 4);
    let bits_per_sample = read_u16(body, 14);

    if channels == 0 || sample_rate == 0 {
        return Err(Error::MalformedContainer(
            "channel count and sample rate must be positive".into(),
        ));
    }

    let format = match format_tag {
        1 => match bits_per_sample {
            8 => SampleFormat::Uint8,
            16 => SampleFormat::Int16,
            32 => SampleFormat::Int32,
            bits => {
                return Err(Error::MalformedContainer(format!(
                    "unsupported sample width: {bits} bits"
                )));
            }
        },
        3 => match bits_per_sample {
            32 => SampleFormat::Float32,
            bits => {
                return Err(Error::UnsupportedFormat(format!(
                    "{bits}-bit IEEE float samples"
                )));
            }
        },
        tag => {
            return Err(Error::UnsupportedFormat(format!(
                "WAVE format tag {tag} (only PCM and IEEE float)"
            )));
        }
    };

    Ok(FmtChunk {
        channels,
        sample_rate,
        format,
    })
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
