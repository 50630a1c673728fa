mod classifier;

use serde::{Deserialize, Serialize};

pub use classifier::EnergyToneClassifier;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ToneLabel {
    Neutral,
    Happy,
    Angry,
    Sad,
}

impl ToneLabel {
    /// Wire codes of the emotion-recognition label set persisted downstream.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neu",
            Self::Happy => "hap",
            Self::Angry => "ang",
            Self::Sad => "sad",
        }
    }
}

impl std::fmt::Display for ToneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified audio segment. The timeline keeps its time dimension; it
/// is never collapsed into counts the way the video path is.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToneSample {
    pub time_secs: f64,
    pub tone: ToneLabel,
    pub score: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum ToneError {
    #[error("tone classification failed: {0}")]
    Classification(String),
}

/// Opaque scoring function over one fixed-size PCM window.
pub trait ToneClassifier: Send + Sync {
    fn classify(&self, window: &[f32]) -> Result<(ToneLabel, f32), ToneError>;
}

/// Fixed one-second windows; a trailing partial window is kept.
pub fn segment_samples(samples: &[f32], sample_rate: u32) -> Vec<&[f32]> {
    if sample_rate == 0 || samples.is_empty() {
        return Vec::new();
    }
    samples.chunks(sample_rate as usize).collect()
}

/// Classifies every segment in order; one sample per segment, ordered by time.
pub fn analyze_tone<C: ToneClassifier>(
    samples: &[f32],
    sample_rate: u32,
    classifier: &C,
) -> Result<Vec<ToneSample>, ToneError> {
    let mut timeline = Vec::new();
    for (i, window) in segment_samples(samples, sample_rate).into_iter().enumerate() {
        let (tone, score) = classifier.classify(window)?;
        timeline.push(ToneSample {
            time_secs: i as f64,
            tone,
            score,
        });
    }
    Ok(timeline)
}
