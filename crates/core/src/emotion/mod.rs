mod classifier;
mod video;

use serde::{Deserialize, Serialize};

pub use classifier::IntensityEmotionClassifier;
pub use video::{FfmpegVideoFrameSource, VideoFrameSource};

/// Classifier input resolution; frames are scaled down before inference.
pub const FRAME_WIDTH: usize = 48;
pub const FRAME_HEIGHT: usize = 48;

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Angry => "Angry",
            Self::Disgust => "Disgust",
            Self::Fear => "Fear",
            Self::Happy => "Happy",
            Self::Sad => "Sad",
            Self::Surprise => "Surprise",
            Self::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grayscale video frame, in decode order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoFrame {
    pub index: u64,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionScore {
    pub frame_index: u64,
    pub label: EmotionLabel,
    pub confidence: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum EmotionError {
    #[error("video decode failed: {0}")]
    Decode(String),

    #[error("frame classification failed: {0}")]
    Classification(String),

    #[error("truncated frame data: {0} trailing bytes")]
    TruncatedFrame(usize),
}

/// Opaque per-frame scoring function. In-process pure compute, one frame at
/// a time, no time dimension.
pub trait FaceEmotionClassifier: Send + Sync {
    fn classify(&self, frame: &VideoFrame) -> Result<EmotionScore, EmotionError>;
}

/// Scans a video frame-by-frame, preserving frame order in the output.
pub async fn scan_video<S, C>(
    source: &S,
    classifier: &C,
    path: std::path::PathBuf,
) -> Result<Vec<EmotionScore>, EmotionError>
where
    S: VideoFrameSource,
    C: FaceEmotionClassifier,
{
    let frames = source.frames(path).await?;
    let mut scores = Vec::with_capacity(frames.len());
    for frame in &frames {
        scores.push(classifier.classify(frame)?);
    }
    Ok(scores)
}
