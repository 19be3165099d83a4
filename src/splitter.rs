//! Duration-ceiling chunking of long recordings.
//!
//! Backends cap how much audio one request may carry, so recordings above
//! the ceiling are partitioned into consecutive, non-overlapping,
//! frame-aligned ranges, and each range is re-wrapped as an independent
//! container. Slicing happens at frame boundaries only; a multi-byte sample
//! is never cut.

use serde::Serialize;
use tracing::info;

use crate::buffer::AudioBuffer;
use crate::error::{Error, Result};
use crate::wav;

/// A frame-aligned sub-range of a recording, wrapped as its own container.
///
/// Produced only by [`split`] and immutable once built. `index` is the
/// partition order, which is also the reassembly order of the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub index: usize,
    pub start_frame: usize,
    pub end_frame: usize,
    pub sample_rate: u32,
    /// The re-wrapped container bytes handed to the inference client.
    #[serde(skip)]
    pub container: Vec<u8>,
}

impl Segment {
    pub fn start_secs(&self) -> f64 {
        self.start_frame as f64 / self.sample_rate as f64
    }

    pub fn end_secs(&self) -> f64 {
        self.end_frame as f64 / self.sample_rate as f64
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs() - self.start_secs()
    }

    pub fn frame_count(&self) -> usize {
        self.end_frame - self.start_frame
    }
}

/// Partition `buffer` into segments no longer than `max_chunk_seconds`.
///
/// A recording at or under the ceiling comes back as a single segment
/// wrapping the whole buffer. Otherwise every segment except possibly the
/// last spans exactly `floor(max_chunk_seconds * sample_rate)` frames.
pub fn split(buffer: &AudioBuffer, max_chunk_seconds: f64) -> Result<Vec<Segment>> {
    let frame_count = buffer.frame_count();
    if buffer.duration_secs() <= max_chunk_seconds {
        return Ok(vec![wrap_range(buffer, 0, 0, frame_count)?]);
    }

    let frames_per_chunk = (max_chunk_seconds * buffer.sample_rate() as f64).floor() as usize;
    if frames_per_chunk == 0 {
        return Err(Error::InvalidRange(format!(
            "chunk ceiling of {max_chunk_seconds}s holds no whole frame at {} Hz",
            buffer.sample_rate()
        )));
    }

    let mut segments = Vec::with_capacity(frame_count.div_ceil(frames_per_chunk));
    let mut start = 0;
    while start < frame_count {
        let end = (start + frames_per_chunk).min(frame_count);
        segments.push(wrap_range(buffer, segments.len(), start, end)?);
        start = end;
    }

    info!(
        segments = segments.len(),
        duration_secs = buffer.duration_secs(),
        ceiling_secs = max_chunk_seconds,
        "split recording"
    );
    Ok(segments)
}

fn wrap_range(
    buffer: &AudioBuffer,
    index: usize,
    start_frame: usize,
    end_frame: usize,
) -> Result<Segment> {
    let frame_count = buffer.frame_count();
    let degenerate = start_frame == end_frame && frame_count != 0;
    if end_frame > frame_count || start_frame > end_frame || degenerate {
        return Err(Error::InvalidRange(format!(
            "frames {start_frame}..{end_frame} of a {frame_count}-frame recording"
        )));
    }

    let frame_size = buffer.frame_size_bytes();
    let slice = &buffer.data()[start_frame * frame_size..end_frame * frame_size];
    let chunk = AudioBuffer::new(
        slice.to_vec(),
        buffer.channels(),
        buffer.format(),
        buffer.sample_rate(),
    )?;

    Ok(Segment {
        index,
        start_frame,
        end_frame,
        sample_rate: buffer.sample_rate(),
        container: wav::encode(&chunk),
    })
}
