mod ffmpeg;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ffmpeg::FfmpegAudioNormalizer;

pub const NORMALIZED_SAMPLE_RATE: u32 = 16_000;
pub const NORMALIZED_SUFFIX: &str = "_normalized";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub const fn wav_mono_16khz() -> Self {
        Self {
            sample_rate: NORMALIZED_SAMPLE_RATE,
            channels: 1,
        }
    }
}

/// Handle to a normalized audio artifact on disk. The caller owns cleanup of
/// the file at `path`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NormalizedAudio {
    pub path: PathBuf,
    pub format: PcmFormat,
    pub duration: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("invalid pcm output: {0}")]
    InvalidPcm(String),

    #[error("no audio samples decoded from {0}")]
    EmptyAudio(PathBuf),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Resamples arbitrary input media to the canonical mono 16 kHz WAV artifact.
/// Always writes a new file; never mutates the input.
pub trait AudioNormalizer: Send + Sync {
    fn normalize(&self, input: PathBuf, output: PathBuf)
        -> BoxFuture<'_, Result<NormalizedAudio>>;

    /// Decodes a supported media file straight to f32 mono 16 kHz samples.
    fn read_samples(&self, path: PathBuf) -> BoxFuture<'_, Result<Vec<f32>>>;
}

/// Sibling path for the normalized artifact: `answer.webm` -> `answer_normalized.wav`.
pub fn normalized_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_owned());
    input.with_file_name(format!("{stem}{NORMALIZED_SUFFIX}.wav"))
}

pub(crate) fn parse_f32le_mono(raw: &[u8]) -> Result<Vec<f32>> {
    if raw.len() % 4 != 0 {
        return Err(DecodeError::InvalidPcm(format!(
            "f32le byte length must be multiple of 4, got {}",
            raw.len()
        )));
    }
    let mut out = Vec::with_capacity(raw.len() / 4);
    for chunk in raw.chunks_exact(4) {
        out.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(out)
}

pub fn duration_from_samples(sample_rate_hz: u32, samples: usize) -> Duration {
    if sample_rate_hz == 0 {
        return Duration::from_secs(0);
    }
    let micros = (u128::from(samples as u64) * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}
