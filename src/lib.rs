//! `longform` — client-side audio preparation and long-recording
//! transcription.
//!
//! This crate provides:
//! - a RIFF/WAVE container codec (decode + minimal canonical encode)
//! - PCM normalization to mono 16-bit at a fixed sample rate
//! - duration-ceiling chunking of long recordings into frame-aligned
//!   segments
//! - per-segment dispatch to a pluggable inference client, with ordered
//!   transcript reassembly
//!
//! The inference backend itself (model, transport, session lifecycle) is an
//! external collaborator injected through [`client::InferenceClient`]; the
//! crate performs no file, network, or model I/O of its own.

// High-level API (most consumers should start here).
pub mod opts;
pub mod transcriber;

// The pluggable inference-backend seam.
pub mod client;

// Audio data model and preparation stages.
pub mod audio_pipeline;
pub mod buffer;
pub mod splitter;
pub mod wav;

// Crate-wide error taxonomy.
pub mod error;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use crate::error::{Error, Result};
