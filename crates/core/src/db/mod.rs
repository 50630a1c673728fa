//! Persistence sink: relational store for evaluation output, keyed by
//! answer id.

use crate::emotion::EmotionLabel;
use crate::scoring::EvaluationResult;
use crate::tone::ToneSample;
use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub type AnswerId = i64;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One `similarity_results` row: the extracted record plus the measured
/// duration of the remote scoring call.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityRecord {
    pub answer_id: AnswerId,
    pub result: EvaluationResult,
    pub response_time_secs: f64,
}

/// Seam between the pipeline and the relational store. Each method writes
/// one logical record; the batched writes are all-or-nothing.
pub trait EvaluationStore: Send + Sync {
    fn save_similarity(&self, record: SimilarityRecord) -> BoxFuture<'_, Result<(), StoreError>>;

    fn save_face_emotions(
        &self,
        answer_id: AnswerId,
        counts: BTreeMap<EmotionLabel, u64>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    fn save_tone_timeline(
        &self,
        answer_id: AnswerId,
        timeline: Vec<ToneSample>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Opens (creating if needed) the database and brings the schema up.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, StoreError> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Idempotent schema creation.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS similarity_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            answer_id INTEGER NOT NULL,
            relevance_score REAL,
            clarity_score REAL,
            depth_score REAL,
            keywords_coverage_score REAL,
            confidence_score REAL,
            experience_score REAL,
            response_time REAL,
            extracted_keywords TEXT,
            matching_keywords TEXT,
            useful_information TEXT,
            key_strengths TEXT,
            areas_for_improvement TEXT
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS face_emotions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            answer_id INTEGER NOT NULL,
            emotion TEXT NOT NULL,
            count INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tone_analysis (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            answer_id INTEGER NOT NULL,
            time REAL NOT NULL,
            tone TEXT NOT NULL,
            score REAL NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EvaluationStore for SqliteStore {
    fn save_similarity(&self, record: SimilarityRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        let pool = self.pool.clone();
        async move {
            let r = &record.result;
            sqlx::query(
                "INSERT INTO similarity_results (
                    answer_id,
                    relevance_score, clarity_score, depth_score, keywords_coverage_score,
                    confidence_score, experience_score, response_time, extracted_keywords,
                    matching_keywords, useful_information, key_strengths, areas_for_improvement
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.answer_id)
            .bind(r.relevance_score)
            .bind(r.clarity_score)
            .bind(r.depth_score)
            .bind(r.keywords_coverage_score)
            .bind(r.confidence_score)
            .bind(r.experience_score)
            .bind(record.response_time_secs)
            .bind(&r.extracted_keywords)
            .bind(&r.matching_keywords)
            .bind(&r.useful_information)
            .bind(&r.key_strengths)
            .bind(&r.areas_for_improvement)
            .execute(&pool)
            .await?;
            info!(answer_id = record.answer_id, "similarity results saved");
            Ok(())
        }
        .boxed()
    }

    fn save_face_emotions(
        &self,
        answer_id: AnswerId,
        counts: BTreeMap<EmotionLabel, u64>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let pool = self.pool.clone();
        async move {
            // All label counts for one answer land in one transaction; a
            // failure mid-batch commits nothing.
            let mut tx = pool.begin().await?;
            for (emotion, count) in &counts {
                sqlx::query("INSERT INTO face_emotions (answer_id, emotion, count) VALUES (?, ?, ?)")
                    .bind(answer_id)
                    .bind(emotion.as_str())
                    .bind(*count as i64)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            info!(answer_id, labels = counts.len(), "face emotions saved");
            Ok(())
        }
        .boxed()
    }

    fn save_tone_timeline(
        &self,
        answer_id: AnswerId,
        timeline: Vec<ToneSample>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await?;
            for sample in &timeline {
                sqlx::query("INSERT INTO tone_analysis (answer_id, time, tone, score) VALUES (?, ?, ?, ?)")
                    .bind(answer_id)
                    .bind(sample.time_secs)
                    .bind(sample.tone.as_str())
                    .bind(f64::from(sample.score))
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            info!(answer_id, segments = timeline.len(), "tone analysis saved");
            Ok(())
        }
        .boxed()
    }
}
