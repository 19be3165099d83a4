use serde::Serialize;
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Structural and format errors are raised by the stage that detects them and
/// are never retried or silently recovered. Backend failures are aggregated
/// per segment so callers can see exactly which time ranges failed and decide
/// what to re-drive.
#[derive(Debug, Error)]
pub enum Error {
    /// The input container failed structural validation.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// The sample encoding is outside the supported set (unsigned 8-bit,
    /// signed 16/32-bit, float32; any positive channel count).
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The splitter produced a zero-length or out-of-bounds range.
    #[error("invalid segment range: {0}")]
    InvalidRange(String),

    /// The resampler rejected its configuration or an input block.
    #[error("resample failed: {0}")]
    Resample(String),

    /// One or more segments failed at the inference backend.
    #[error(transparent)]
    Backend(#[from] TranscriptionFailure),
}

/// Error reported by an [`InferenceClient`](crate::client::InferenceClient)
/// implementation for a single request.
///
/// The message is human-readable and backend-defined; it covers transport
/// failures as well as model errors the backend surfaces as text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Context for one failed segment within a transcription call.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentFailure {
    /// Partition-order index of the failed segment.
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    /// The backend's message for this segment.
    pub message: String,
}

/// Aggregate failure for a transcription call.
///
/// Every segment is attempted even when a sibling fails; each failure is
/// recorded here with its index and time range. A call that produced this
/// never returns a partial transcript.
#[derive(Debug, Clone, Error)]
#[error(
    "backend failed for {}/{} segment(s): {}",
    .failures.len(),
    .segment_count,
    describe(.failures)
)]
pub struct TranscriptionFailure {
    pub failures: Vec<SegmentFailure>,
    /// Total number of segments in the call, failed or not.
    pub segment_count: usize,
}

fn describe(failures: &[SegmentFailure]) -> String {
    failures
        .iter()
        .map(|f| {
            format!(
                "segment {} [{:.1}s..{:.1}s]: {}",
                f.index, f.start_secs, f.end_secs, f.message
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
