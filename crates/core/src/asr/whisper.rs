use crate::asr::{Transcript, TranscriptionBackend, TranscriptionError};
use crate::audio::{duration_from_samples, NORMALIZED_SAMPLE_RATE};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::Path;
use std::sync::Arc;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper in translate mode. The context is loaded once at construction and
/// shared read-only across calls; each call gets its own inference state.
#[derive(Clone)]
pub struct WhisperBackend {
    context: Arc<WhisperContext>,
}

impl WhisperBackend {
    pub fn new(model_path: &Path) -> Result<Self, TranscriptionError> {
        let context = WhisperContext::new_with_params(
            &model_path.to_string_lossy(),
            WhisperContextParameters::default(),
        )
        .map_err(|e| TranscriptionError::ModelLoad(e.to_string()))?;
        Ok(Self {
            context: Arc::new(context),
        })
    }

    fn run_inference(
        context: &WhisperContext,
        samples: &[f32],
    ) -> Result<String, TranscriptionError> {
        let mut state = context
            .create_state()
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_translate(true);
        params.set_language(Some("auto"));
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;
        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| TranscriptionError::Inference(e.to_string()))?;
            text.push_str(&segment);
        }
        Ok(text)
    }
}

impl TranscriptionBackend for WhisperBackend {
    fn translate(
        &self,
        samples: Vec<f32>,
    ) -> BoxFuture<'_, Result<Transcript, TranscriptionError>> {
        let context = self.context.clone();
        async move {
            let audio_duration = duration_from_samples(NORMALIZED_SAMPLE_RATE, samples.len());

            let text = tokio::task::spawn_blocking(move || {
                Self::run_inference(&context, &samples)
            })
            .await
            .map_err(|e| TranscriptionError::Inference(e.to_string()))??;

            let text = text.trim().to_owned();
            if text.is_empty() {
                return Err(TranscriptionError::EmptyTranscript);
            }

            Ok(Transcript {
                text,
                audio_duration,
            })
        }
        .boxed()
    }
}
