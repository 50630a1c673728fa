#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use interview_analyzer_core::config::{
    resolve_api_key, resolve_optional_path, AppConfig, ApiKeys, AsrConfig, Env, ScoringConfig,
    StdEnv, DEFAULT_DB_PATH, ENV_OPENAI_API_KEY, ENV_WHISPER_MODEL_PATH,
};
use interview_analyzer_core::pipeline::AnswerRequest;
use interview_analyzer_core::scoring::QuestionType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "interview-analyzer")]
#[command(about = "Automated interview answer analysis (ASR->LLM scoring + emotion/tone)")]
struct Args {
    /// Identifier of the answer row created upstream.
    #[arg(long)]
    answer_id: i64,

    /// Recorded audio/video answer file.
    #[arg(long)]
    media: PathBuf,

    #[arg(long)]
    question: String,

    /// Either "role-based" or "personal".
    #[arg(long, default_value = "personal")]
    question_type: String,

    /// Comma-separated keywords for role-based questions.
    #[arg(long)]
    keywords: Option<String>,

    #[arg(long)]
    template_answer: Option<String>,

    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    #[arg(long)]
    openai_api_key: Option<String>,

    #[arg(long, env = ENV_WHISPER_MODEL_PATH)]
    whisper_model: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let (cfg, request) = build_config(&args, &env)?;

    tracing::info!(
        answer_id = request.answer_id,
        question_type = %request.question_type,
        media = %request.media_path.display(),
        "config loaded"
    );

    run(cfg, request).await
}

#[cfg(feature = "whisper-rs")]
async fn run(cfg: AppConfig, request: AnswerRequest) -> anyhow::Result<()> {
    use interview_analyzer_core::asr::WhisperBackend;
    use interview_analyzer_core::scoring::{DummyScoringClient, OpenAiScoringClient};

    let model_path = cfg
        .asr
        .model_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("a Whisper model path is required (--whisper-model)"))?;
    let asr = WhisperBackend::new(&model_path)?;

    match cfg.api_keys.openai.clone() {
        Some(key) => {
            let scoring = OpenAiScoringClient::new(key.expose().to_string(), cfg.scoring.clone())?;
            run_with_components(cfg, request, asr, scoring).await
        }
        None => {
            tracing::warn!("no OpenAI API key configured; using offline dummy scoring");
            run_with_components(cfg, request, asr, DummyScoringClient::new()).await
        }
    }
}

#[cfg(not(feature = "whisper-rs"))]
async fn run(_cfg: AppConfig, _request: AnswerRequest) -> anyhow::Result<()> {
    anyhow::bail!("built without ASR support; rebuild with the whisper-rs feature")
}

#[cfg(feature = "whisper-rs")]
async fn run_with_components<A, S>(
    cfg: AppConfig,
    request: AnswerRequest,
    asr: A,
    scoring: S,
) -> anyhow::Result<()>
where
    A: interview_analyzer_core::asr::TranscriptionBackend,
    S: interview_analyzer_core::scoring::ScoringClient,
{
    use interview_analyzer_core::audio::FfmpegAudioNormalizer;
    use interview_analyzer_core::db::{init_database, SqliteStore};
    use interview_analyzer_core::emotion::{FfmpegVideoFrameSource, IntensityEmotionClassifier};
    use interview_analyzer_core::pipeline::AnswerPipeline;
    use interview_analyzer_core::tone::EnergyToneClassifier;
    use std::sync::Arc;

    let pool = init_database(&cfg.db_path).await?;
    let pipeline = AnswerPipeline {
        normalizer: FfmpegAudioNormalizer::default(),
        asr,
        scoring,
        frames: FfmpegVideoFrameSource::new(),
        face: IntensityEmotionClassifier::new(),
        tone: EnergyToneClassifier::new(),
        store: Arc::new(SqliteStore::new(pool)),
    };

    let report = pipeline.process_answer(&request).await;

    if let Some(counts) = &report.emotion_counts {
        tracing::info!(answer_id = request.answer_id, labels = counts.len(), "emotion counts stored");
    }
    if let Some(timeline) = &report.tone_timeline {
        tracing::info!(answer_id = request.answer_id, segments = timeline.len(), "tone timeline stored");
    }

    if report.evaluation.is_none()
        && report.emotion_counts.is_none()
        && report.tone_timeline.is_none()
    {
        anyhow::bail!("all analysis paths failed for answer {}", request.answer_id);
    }

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: &Args, env: &impl Env) -> anyhow::Result<(AppConfig, AnswerRequest)> {
    let question_type: QuestionType = args.question_type.parse()?;

    let keywords = args
        .keywords
        .as_deref()
        .map(|s| {
            s.split(',')
                .map(|k| k.trim().to_owned())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let openai = resolve_api_key(args.openai_api_key.clone(), ENV_OPENAI_API_KEY, env)?;
    let model_path = resolve_optional_path(args.whisper_model.clone(), ENV_WHISPER_MODEL_PATH, env);

    let cfg = AppConfig {
        db_path: args.db.clone(),
        api_keys: ApiKeys { openai },
        scoring: ScoringConfig::default(),
        asr: AsrConfig { model_path },
    };

    let request = AnswerRequest {
        answer_id: args.answer_id,
        media_path: args.media.clone(),
        question: args.question.clone(),
        question_type,
        keywords,
        template_answer: args.template_answer.clone(),
    };

    Ok((cfg, request))
}
