use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use std::fs;
use std::path::PathBuf;

use longform::audio_pipeline::{self, TARGET_SAMPLE_RATE};
use longform::buffer::{AudioBuffer, SampleFormat};
use longform::opts::DEFAULT_MAX_CHUNK_SECONDS;
use longform::splitter::{self, Segment};
use longform::wav;

fn main() -> Result<()> {
    longform::logging::init();
    let params = get_params()?;

    let buffer = match &params.audio_path {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            wav::decode(&bytes)?
        }
        // No input file: fabricate silence at the canonical format. Handy
        // for smoke-testing a backend without real audio on hand.
        None => silence(params.silence_secs)?,
    };

    let buffer = if audio_pipeline::needs_normalization(&buffer, TARGET_SAMPLE_RATE) {
        audio_pipeline::normalize(&buffer, TARGET_SAMPLE_RATE)?
    } else {
        buffer
    };

    let segments = splitter::split(&buffer, params.max_chunk_seconds)?;

    fs::create_dir_all(&params.out_dir)
        .with_context(|| format!("failed to create '{}'", params.out_dir.display()))?;

    let mut manifest = Vec::with_capacity(segments.len());
    for segment in &segments {
        let path = params
            .out_dir
            .join(format!("segment-{:03}.wav", segment.index));
        fs::write(&path, &segment.container)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        manifest.push(ManifestEntry {
            path,
            start_secs: segment.start_secs(),
            end_secs: segment.end_secs(),
            segment,
        });
    }

    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

/// One written segment file, as reported on stdout.
#[derive(Serialize)]
struct ManifestEntry<'a> {
    path: PathBuf,
    start_secs: f64,
    end_secs: f64,
    #[serde(flatten)]
    segment: &'a Segment,
}

/// All-zero 16-bit mono PCM at the canonical rate.
fn silence(secs: f64) -> Result<AudioBuffer> {
    let frames = (secs * TARGET_SAMPLE_RATE as f64).round() as usize;
    Ok(AudioBuffer::new(
        vec![0u8; frames * 2],
        1,
        SampleFormat::Int16,
        TARGET_SAMPLE_RATE,
    )?)
}

#[derive(Parser, Debug)]
#[command(name = "longform")]
#[command(about = "Prepare a recording for transcription: normalize, split, write segment containers")]
struct Params {
    /// Input WAV file. When omitted, silence is generated instead.
    #[arg(short = 'a', long = "audio")]
    pub audio_path: Option<PathBuf>,

    /// Duration of generated silence when no input file is given.
    #[arg(long = "silence-secs", default_value_t = 1.0)]
    pub silence_secs: f64,

    /// Directory that receives the segment WAV files.
    #[arg(short = 'o', long = "out-dir", default_value = "segments")]
    pub out_dir: PathBuf,

    /// Maximum duration of a single segment in seconds.
    #[arg(long = "max-chunk-seconds", default_value_t = DEFAULT_MAX_CHUNK_SECONDS)]
    pub max_chunk_seconds: f64,
}

fn get_params() -> Result<Params> {
    Ok(Params::parse())
}
