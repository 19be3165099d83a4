//! High-level API for running transcriptions.
//!
//! `Transcriber` wires the lower-level stages together: container decode,
//! conditional normalization, duration-ceiling splitting, per-segment
//! dispatch to the injected [`InferenceClient`], and ordered transcript
//! assembly. The stages stay testable in their own modules; this module owns
//! sequencing and the failure-isolation policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio_pipeline::{self, TARGET_SAMPLE_RATE};
use crate::buffer::AudioBuffer;
use crate::client::InferenceClient;
use crate::error::{BackendError, Result, SegmentFailure, TranscriptionFailure};
use crate::opts::Opts;
use crate::splitter::{self, Segment};
use crate::wav;

/// Audio handed in by the caller.
///
/// This crate performs no file or network I/O of its own; whoever owns the
/// bytes picks the variant.
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// A pre-wrapped PCM container.
    Container(Vec<u8>),
    /// Raw PCM frames with known format parameters.
    Pcm(AudioBuffer),
}

/// The main high-level transcription entry point.
///
/// `Transcriber` is generic over the inference client so the backend
/// connection stays an injected capability. Construct once, call
/// [`transcribe`](Transcriber::transcribe) per recording; calls for
/// different recordings share nothing mutable.
pub struct Transcriber<C: InferenceClient> {
    client: C,
}

impl<C: InferenceClient> Transcriber<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Access the injected client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Transcribe one recording into a single ordered transcript.
    ///
    /// The input is normalized to mono 16-bit [`TARGET_SAMPLE_RATE`] audio
    /// only when it is not already in that shape, split when it exceeds the
    /// duration ceiling, and dispatched segment by segment. Segment texts
    /// are joined with a single space, in partition order.
    ///
    /// Failure isolation: every segment is attempted even when a sibling
    /// fails; all backend failures come back together in
    /// [`Error::Backend`](crate::Error::Backend) with their segment index
    /// and time range. A failed call never yields a partial transcript.
    pub fn transcribe(&self, input: AudioInput, opts: &Opts) -> Result<String>
    where
        C: Sync,
    {
        let started = Instant::now();

        let buffer = match input {
            AudioInput::Container(bytes) => wav::decode(&bytes)?,
            AudioInput::Pcm(buffer) => buffer,
        };
        let buffer = if audio_pipeline::needs_normalization(&buffer, TARGET_SAMPLE_RATE) {
            audio_pipeline::normalize(&buffer, TARGET_SAMPLE_RATE)?
        } else {
            buffer
        };
        let segments = splitter::split(&buffer, opts.max_chunk_seconds)?;
        let prepared = started.elapsed();

        info!(
            segments = segments.len(),
            duration_secs = buffer.duration_secs(),
            language = opts.language.as_deref().unwrap_or("auto"),
            "transcribing recording"
        );

        let texts = self.dispatch(&segments, opts)?;
        debug!(
            prep_ms = prepared.as_millis() as u64,
            inference_ms = started.elapsed().saturating_sub(prepared).as_millis() as u64,
            "transcription timing"
        );
        Ok(texts.join(" "))
    }

    /// Run every segment through the client and collect texts in partition
    /// order.
    fn dispatch(&self, segments: &[Segment], opts: &Opts) -> Result<Vec<String>>
    where
        C: Sync,
    {
        let language = opts.language.as_deref();
        let results = if opts.enable_parallel_dispatch && segments.len() > 1 {
            self.dispatch_parallel(segments, language)
        } else {
            segments
                .iter()
                .map(|segment| self.client.transcribe(&segment.container, language))
                .collect()
        };

        let mut texts = Vec::with_capacity(segments.len());
        let mut failures = Vec::new();
        for (segment, result) in segments.iter().zip(results) {
            match result {
                Ok(text) => texts.push(text),
                Err(err) => {
                    warn!(
                        segment = segment.index,
                        start_secs = segment.start_secs(),
                        end_secs = segment.end_secs(),
                        error = %err,
                        "segment transcription failed"
                    );
                    failures.push(SegmentFailure {
                        index: segment.index,
                        start_secs: segment.start_secs(),
                        end_secs: segment.end_secs(),
                        message: err.message,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(texts)
        } else {
            Err(TranscriptionFailure {
                failures,
                segment_count: segments.len(),
            }
            .into())
        }
    }

    /// Fan segments out over a scoped worker pool and fan results back in
    /// tagged by index, so partition order survives any completion order.
    fn dispatch_parallel(
        &self,
        segments: &[Segment],
        language: Option<&str>,
    ) -> Vec<std::result::Result<String, BackendError>>
    where
        C: Sync,
    {
        let workers = num_cpus::get().min(segments.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, std::result::Result<String, BackendError>)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let at = next.fetch_add(1, Ordering::Relaxed);
                        let Some(segment) = segments.get(at) else { break };
                        let result = self.client.transcribe(&segment.container, language);
                        if tx.send((at, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            // The workers hold the remaining senders; dropping ours lets the
            // receive loop end when they finish.
            drop(tx);

            let mut ordered: Vec<Option<std::result::Result<String, BackendError>>> =
                segments.iter().map(|_| None).collect();
            for (at, result) in rx {
                ordered[at] = Some(result);
            }
            ordered
                .into_iter()
                .map(|slot| {
                    slot.unwrap_or_else(|| Err(BackendError::new("segment result never arrived")))
                })
                .collect()
        })
    }
}
