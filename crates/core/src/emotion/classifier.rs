use crate::emotion::{EmotionError, EmotionLabel, EmotionScore, FaceEmotionClassifier, VideoFrame};

/// Heuristic stand-in for a trained face-emotion model, keyed on frame
/// brightness and contrast. Deterministic, so the crate runs end-to-end
/// without external model weights.
#[derive(Clone, Debug)]
pub struct IntensityEmotionClassifier {
    bright_threshold: f32,
    dark_threshold: f32,
    flat_variance: f32,
    busy_variance: f32,
}

impl Default for IntensityEmotionClassifier {
    fn default() -> Self {
        Self {
            bright_threshold: 150.0,
            dark_threshold: 60.0,
            flat_variance: 100.0,
            busy_variance: 2500.0,
        }
    }
}

impl IntensityEmotionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn mean_and_variance(pixels: &[u8]) -> (f32, f32) {
        let n = pixels.len() as f32;
        let mean = pixels.iter().map(|&p| f32::from(p)).sum::<f32>() / n;
        let variance = pixels
            .iter()
            .map(|&p| {
                let d = f32::from(p) - mean;
                d * d
            })
            .sum::<f32>()
            / n;
        (mean, variance)
    }
}

impl FaceEmotionClassifier for IntensityEmotionClassifier {
    fn classify(&self, frame: &VideoFrame) -> Result<EmotionScore, EmotionError> {
        if frame.pixels.is_empty() {
            return Err(EmotionError::Classification("empty frame".to_owned()));
        }

        let (mean, variance) = Self::mean_and_variance(&frame.pixels);

        let label = if variance < self.flat_variance {
            EmotionLabel::Neutral
        } else if variance > self.busy_variance {
            EmotionLabel::Surprise
        } else if mean > self.bright_threshold {
            EmotionLabel::Happy
        } else if mean < self.dark_threshold {
            EmotionLabel::Sad
        } else {
            EmotionLabel::Neutral
        };

        // Confidence falls off toward the decision boundaries.
        let spread = (variance / self.busy_variance).clamp(0.0, 1.0);
        let confidence = (0.5 + spread / 2.0).clamp(0.0, 1.0);

        Ok(EmotionScore {
            frame_index: frame.index,
            label,
            confidence,
        })
    }
}
