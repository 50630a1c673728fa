use crate::tone::{ToneClassifier, ToneError, ToneLabel};

/// Heuristic stand-in for a trained speech-emotion model, keyed on segment
/// energy and zero-crossing rate. High energy with rapid sign changes reads
/// as agitated speech; low energy as flat speech.
#[derive(Clone, Debug)]
pub struct EnergyToneClassifier {
    high_energy: f32,
    low_energy: f32,
    high_zcr: f32,
}

impl Default for EnergyToneClassifier {
    fn default() -> Self {
        Self {
            high_energy: 0.2,
            low_energy: 0.02,
            high_zcr: 0.15,
        }
    }
}

impl EnergyToneClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn rms(window: &[f32]) -> f32 {
        let sum_sq: f32 = window.iter().map(|s| s * s).sum();
        (sum_sq / window.len() as f32).sqrt()
    }

    fn zero_crossing_rate(window: &[f32]) -> f32 {
        if window.len() < 2 {
            return 0.0;
        }
        let crossings = window
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count();
        crossings as f32 / (window.len() - 1) as f32
    }
}

impl ToneClassifier for EnergyToneClassifier {
    fn classify(&self, window: &[f32]) -> Result<(ToneLabel, f32), ToneError> {
        if window.is_empty() {
            return Err(ToneError::Classification("empty window".to_owned()));
        }

        let rms = Self::rms(window);
        let zcr = Self::zero_crossing_rate(window);

        let label = if rms > self.high_energy {
            if zcr > self.high_zcr {
                ToneLabel::Angry
            } else {
                ToneLabel::Happy
            }
        } else if rms < self.low_energy {
            ToneLabel::Sad
        } else {
            ToneLabel::Neutral
        };

        let score = (0.5 + (rms / self.high_energy).clamp(0.0, 1.0) / 2.0).clamp(0.0, 1.0);
        Ok((label, score))
    }
}
