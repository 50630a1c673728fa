#[cfg(feature = "whisper-rs")]
mod whisper;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "whisper-rs")]
pub use whisper::WhisperBackend;

/// Output of the speech-to-text stage, already translated to the fixed
/// target language (English).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub audio_duration: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum TranscriptionError {
    #[error("failed to load speech model: {0}")]
    ModelLoad(String),

    #[error("speech model inference failed: {0}")]
    Inference(String),

    #[error("model produced no text (silence-only audio?)")]
    EmptyTranscript,
}

/// Blocking heavyweight model behind an async seam. Callers must feed
/// normalized PCM (f32 mono 16 kHz); raw media never reaches the model.
pub trait TranscriptionBackend: Send + Sync {
    fn translate(
        &self,
        samples: Vec<f32>,
    ) -> BoxFuture<'_, Result<Transcript, TranscriptionError>>;
}
