//! Per-answer orchestration: normalize -> transcribe -> prompt -> score ->
//! extract -> persist, plus the independent emotion and tone paths. One
//! answer runs start to finish; stages never overlap.

use crate::aggregate::count_labels;
use crate::asr::{TranscriptionBackend, TranscriptionError};
use crate::audio::{normalized_output_path, AudioNormalizer, DecodeError, NORMALIZED_SAMPLE_RATE};
use crate::db::{AnswerId, EvaluationStore, SimilarityRecord, StoreError};
use crate::emotion::{
    scan_video, EmotionError, EmotionLabel, FaceEmotionClassifier, VideoFrameSource,
};
use crate::scoring::{
    build_prompt, extract_evaluation, AnswerContext, EvaluationResult, QuestionType, ScoringClient,
};
use crate::tone::{analyze_tone, ToneClassifier, ToneError, ToneSample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Emotion(#[from] EmotionError),

    #[error(transparent)]
    Tone(#[from] ToneError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One answer to evaluate. Created upstream; immutable here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerRequest {
    pub answer_id: AnswerId,
    pub media_path: PathBuf,
    pub question: String,
    pub question_type: QuestionType,
    pub keywords: Vec<String>,
    pub template_answer: Option<String>,
}

/// Whether the scoring path produced a persisted record or was skipped
/// after a failed remote call.
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationOutcome {
    Persisted(EvaluationResult),
    Skipped,
}

/// Per-path results of a full answer run. A `None` path failed and was
/// logged; nothing was persisted for it.
#[derive(Clone, Debug, Default)]
pub struct AnswerReport {
    pub evaluation: Option<EvaluationOutcome>,
    pub emotion_counts: Option<BTreeMap<EmotionLabel, u64>>,
    pub tone_timeline: Option<Vec<ToneSample>>,
}

/// All stage handles are injected, so any of them can be a test double.
pub struct AnswerPipeline<N, A, S, V, C, T> {
    pub normalizer: N,
    pub asr: A,
    pub scoring: S,
    pub frames: V,
    pub face: C,
    pub tone: T,
    pub store: Arc<dyn EvaluationStore>,
}

impl<N, A, S, V, C, T> AnswerPipeline<N, A, S, V, C, T>
where
    N: AudioNormalizer,
    A: TranscriptionBackend,
    S: ScoringClient,
    V: VideoFrameSource,
    C: FaceEmotionClassifier,
    T: ToneClassifier,
{
    /// The answer-evaluation path. A failed scoring call is not an error:
    /// it logs, skips extraction and persistence, and leaves the other
    /// paths untouched.
    pub async fn evaluate_answer(
        &self,
        request: &AnswerRequest,
    ) -> Result<EvaluationOutcome, PipelineError> {
        let output = normalized_output_path(&request.media_path);
        let normalized = self
            .normalizer
            .normalize(request.media_path.clone(), output)
            .await?;
        let samples = self.normalizer.read_samples(normalized.path.clone()).await?;
        let transcript = self.asr.translate(samples).await?;

        tracing::info!(
            answer_id = request.answer_id,
            transcript_chars = transcript.text.len(),
            "transcription complete"
        );

        let ctx = AnswerContext {
            question: request.question.clone(),
            keywords: request.keywords.clone(),
            transcript: transcript.text,
            question_type: request.question_type,
            template_answer: request.template_answer.clone(),
        };
        let prompt = build_prompt(&ctx);

        let started = Instant::now();
        let response = match self.scoring.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    answer_id = request.answer_id,
                    error = %e,
                    "scoring call failed; skipping persistence for this answer"
                );
                return Ok(EvaluationOutcome::Skipped);
            }
        };
        let response_time = started.elapsed();

        let result = extract_evaluation(&response, request.question_type);
        self.store
            .save_similarity(SimilarityRecord {
                answer_id: request.answer_id,
                result: result.clone(),
                response_time_secs: response_time.as_secs_f64(),
            })
            .await?;

        Ok(EvaluationOutcome::Persisted(result))
    }

    /// The video path: frame-by-frame scan collapsed into per-label counts.
    pub async fn analyze_video_emotions(
        &self,
        answer_id: AnswerId,
        video_path: PathBuf,
    ) -> Result<BTreeMap<EmotionLabel, u64>, PipelineError> {
        let scores = scan_video(&self.frames, &self.face, video_path).await?;
        let counts = count_labels(scores.iter().map(|s| s.label));

        if counts.is_empty() {
            tracing::info!(answer_id, "no emotions detected, nothing to persist");
            return Ok(counts);
        }

        self.store
            .save_face_emotions(answer_id, counts.clone())
            .await?;
        Ok(counts)
    }

    /// The audio path: per-segment tone timeline, time dimension retained.
    pub async fn analyze_audio_tone(
        &self,
        answer_id: AnswerId,
        media_path: PathBuf,
    ) -> Result<Vec<ToneSample>, PipelineError> {
        let samples = self.normalizer.read_samples(media_path).await?;
        let timeline = analyze_tone(&samples, NORMALIZED_SAMPLE_RATE, &self.tone)?;
        self.store
            .save_tone_timeline(answer_id, timeline.clone())
            .await?;
        Ok(timeline)
    }

    /// Runs all three analysis paths for one answer. Each path fails
    /// independently: a failure is logged and leaves its slot empty.
    pub async fn process_answer(&self, request: &AnswerRequest) -> AnswerReport {
        let mut report = AnswerReport::default();

        match self.evaluate_answer(request).await {
            Ok(outcome) => report.evaluation = Some(outcome),
            Err(e) => {
                tracing::error!(answer_id = request.answer_id, error = %e, "answer evaluation failed");
            }
        }

        match self
            .analyze_video_emotions(request.answer_id, request.media_path.clone())
            .await
        {
            Ok(counts) => report.emotion_counts = Some(counts),
            Err(e) => {
                tracing::error!(answer_id = request.answer_id, error = %e, "emotion analysis failed");
            }
        }

        match self
            .analyze_audio_tone(request.answer_id, request.media_path.clone())
            .await
        {
            Ok(timeline) => report.tone_timeline = Some(timeline),
            Err(e) => {
                tracing::error!(answer_id = request.answer_id, error = %e, "tone analysis failed");
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::Transcript;
    use crate::audio::{NormalizedAudio, PcmFormat};
    use crate::emotion::{EmotionScore, VideoFrame, FRAME_HEIGHT, FRAME_WIDTH};
    use crate::scoring::ScoringError;
    use crate::tone::ToneLabel;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::Mutex;
    use std::time::Duration;

    const FIXTURE_RESPONSE: &str = "Relevance: 0.9\nClarity: 0.85\nDepth of Information: 0.8\nExtracted Keywords: team, payment gateway\nKey strengths: leadership, technical delivery";

    struct StubNormalizer {
        samples: Vec<f32>,
        fail: bool,
    }

    impl AudioNormalizer for StubNormalizer {
        fn normalize(
            &self,
            input: PathBuf,
            output: PathBuf,
        ) -> BoxFuture<'_, crate::audio::Result<NormalizedAudio>> {
            let fail = self.fail;
            async move {
                if fail {
                    return Err(DecodeError::EmptyAudio(input));
                }
                Ok(NormalizedAudio {
                    path: output,
                    format: PcmFormat::wav_mono_16khz(),
                    duration: Duration::from_secs(1),
                })
            }
            .boxed()
        }

        fn read_samples(&self, path: PathBuf) -> BoxFuture<'_, crate::audio::Result<Vec<f32>>> {
            let samples = self.samples.clone();
            let fail = self.fail;
            async move {
                if fail {
                    return Err(DecodeError::EmptyAudio(path));
                }
                Ok(samples)
            }
            .boxed()
        }
    }

    struct StubAsr;

    impl TranscriptionBackend for StubAsr {
        fn translate(
            &self,
            samples: Vec<f32>,
        ) -> BoxFuture<'_, Result<Transcript, TranscriptionError>> {
            async move {
                Ok(Transcript {
                    text: "I led a team of five engineers to ship a payment gateway".to_owned(),
                    audio_duration: Duration::from_secs(samples.len() as u64 / 16_000),
                })
            }
            .boxed()
        }
    }

    struct StubScoring {
        response: Option<String>,
    }

    impl ScoringClient for StubScoring {
        fn complete(&self, _prompt: String) -> BoxFuture<'_, Result<String, ScoringError>> {
            let response = self.response.clone();
            async move {
                response.ok_or_else(|| ScoringError::Api("HTTP 429: quota exceeded".to_owned()))
            }
            .boxed()
        }
    }

    struct StubFrames {
        count: usize,
    }

    impl VideoFrameSource for StubFrames {
        fn frames(&self, _path: PathBuf) -> BoxFuture<'_, Result<Vec<VideoFrame>, EmotionError>> {
            let count = self.count;
            async move {
                Ok((0..count)
                    .map(|i| VideoFrame {
                        index: i as u64,
                        width: FRAME_WIDTH,
                        height: FRAME_HEIGHT,
                        pixels: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
                    })
                    .collect())
            }
            .boxed()
        }
    }

    struct SequenceClassifier {
        labels: Vec<EmotionLabel>,
    }

    impl FaceEmotionClassifier for SequenceClassifier {
        fn classify(&self, frame: &VideoFrame) -> Result<EmotionScore, EmotionError> {
            let label = self.labels[frame.index as usize % self.labels.len()];
            Ok(EmotionScore {
                frame_index: frame.index,
                label,
                confidence: 1.0,
            })
        }
    }

    struct FixedTone;

    impl ToneClassifier for FixedTone {
        fn classify(&self, _window: &[f32]) -> Result<(ToneLabel, f32), ToneError> {
            Ok((ToneLabel::Neutral, 0.75))
        }
    }

    #[derive(Debug)]
    enum StoreCall {
        Similarity(SimilarityRecord),
        Emotions(AnswerId, BTreeMap<EmotionLabel, u64>),
        Tone(AnswerId, Vec<ToneSample>),
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<StoreCall>>,
    }

    impl EvaluationStore for RecordingStore {
        fn save_similarity(
            &self,
            record: SimilarityRecord,
        ) -> BoxFuture<'_, Result<(), StoreError>> {
            self.calls.lock().unwrap().push(StoreCall::Similarity(record));
            async move { Ok(()) }.boxed()
        }

        fn save_face_emotions(
            &self,
            answer_id: AnswerId,
            counts: BTreeMap<EmotionLabel, u64>,
        ) -> BoxFuture<'_, Result<(), StoreError>> {
            self.calls
                .lock()
                .unwrap()
                .push(StoreCall::Emotions(answer_id, counts));
            async move { Ok(()) }.boxed()
        }

        fn save_tone_timeline(
            &self,
            answer_id: AnswerId,
            timeline: Vec<ToneSample>,
        ) -> BoxFuture<'_, Result<(), StoreError>> {
            self.calls
                .lock()
                .unwrap()
                .push(StoreCall::Tone(answer_id, timeline));
            async move { Ok(()) }.boxed()
        }
    }

    fn request() -> AnswerRequest {
        AnswerRequest {
            answer_id: 11,
            media_path: PathBuf::from("/tmp/answer11.webm"),
            question: "Tell me about a project you led.".to_owned(),
            question_type: QuestionType::Personal,
            keywords: Vec::new(),
            template_answer: None,
        }
    }

    fn pipeline(
        scoring_response: Option<String>,
        store: Arc<RecordingStore>,
        frame_count: usize,
        normalizer_fails: bool,
    ) -> AnswerPipeline<StubNormalizer, StubAsr, StubScoring, StubFrames, SequenceClassifier, FixedTone>
    {
        use EmotionLabel::*;
        AnswerPipeline {
            normalizer: StubNormalizer {
                samples: vec![0.1f32; 16_000 * 3],
                fail: normalizer_fails,
            },
            asr: StubAsr,
            scoring: StubScoring {
                response: scoring_response,
            },
            frames: StubFrames { count: frame_count },
            face: SequenceClassifier {
                labels: vec![Happy, Happy, Sad, Neutral, Happy, Sad, Sad, Neutral, Happy, Happy],
            },
            tone: FixedTone,
            store,
        }
    }

    #[tokio::test]
    async fn successful_evaluation_persists_extracted_record() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(Some(FIXTURE_RESPONSE.to_owned()), store.clone(), 10, false);

        let outcome = p.evaluate_answer(&request()).await.expect("evaluation");
        let result = match outcome {
            EvaluationOutcome::Persisted(r) => r,
            EvaluationOutcome::Skipped => panic!("expected persisted outcome"),
        };
        assert_eq!(result.relevance_score, Some(0.9));
        assert_eq!(result.clarity_score, Some(0.85));
        assert_eq!(result.depth_score, Some(0.8));
        assert_eq!(result.keywords_coverage_score, None);
        assert_eq!(result.confidence_score, None);
        assert_eq!(result.experience_score, None);
        assert_eq!(result.extracted_keywords, "team, payment gateway");
        assert_eq!(
            result.key_strengths.as_deref(),
            Some("leadership, technical delivery")
        );

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            StoreCall::Similarity(record) => {
                assert_eq!(record.answer_id, 11);
                assert_eq!(record.result, result);
                assert!(record.response_time_secs >= 0.0);
            }
            other => panic!("unexpected store call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_scoring_call_skips_persistence_entirely() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(None, store.clone(), 10, false);

        let outcome = p.evaluate_answer(&request()).await.expect("evaluation");
        assert_eq!(outcome, EvaluationOutcome::Skipped);
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn decode_failure_aborts_evaluation_before_persistence() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(Some(FIXTURE_RESPONSE.to_owned()), store.clone(), 10, true);

        let err = p.evaluate_answer(&request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn video_emotion_counts_are_aggregated_and_persisted() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(Some(FIXTURE_RESPONSE.to_owned()), store.clone(), 10, false);

        let counts = p
            .analyze_video_emotions(11, PathBuf::from("/tmp/answer11.webm"))
            .await
            .expect("emotion path");
        assert_eq!(counts.get(&EmotionLabel::Happy), Some(&5));
        assert_eq!(counts.get(&EmotionLabel::Sad), Some(&3));
        assert_eq!(counts.get(&EmotionLabel::Neutral), Some(&2));
        assert_eq!(counts.values().sum::<u64>(), 10);

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            StoreCall::Emotions(answer_id, stored) => {
                assert_eq!(*answer_id, 11);
                assert_eq!(stored, &counts);
            }
            other => panic!("unexpected store call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_video_persists_nothing() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(Some(FIXTURE_RESPONSE.to_owned()), store.clone(), 0, false);

        let counts = p
            .analyze_video_emotions(11, PathBuf::from("/tmp/answer11.webm"))
            .await
            .expect("emotion path");
        assert!(counts.is_empty());
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tone_timeline_is_persisted_per_segment() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(Some(FIXTURE_RESPONSE.to_owned()), store.clone(), 10, false);

        let timeline = p
            .analyze_audio_tone(11, PathBuf::from("/tmp/answer11.webm"))
            .await
            .expect("tone path");
        // Three seconds of stubbed audio -> three one-second segments.
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[2].time_secs, 2.0);

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            StoreCall::Tone(answer_id, stored) => {
                assert_eq!(*answer_id, 11);
                assert_eq!(stored.len(), 3);
            }
            other => panic!("unexpected store call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn scoring_failure_leaves_other_paths_untouched() {
        let store = Arc::new(RecordingStore::default());
        let p = pipeline(None, store.clone(), 10, false);

        let report = p.process_answer(&request()).await;
        assert_eq!(report.evaluation, Some(EvaluationOutcome::Skipped));
        assert!(report.emotion_counts.is_some());
        assert!(report.tone_timeline.is_some());

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|c| !matches!(c, StoreCall::Similarity(_))));
    }
}
