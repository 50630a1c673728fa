mod dummy;
mod extract;
mod openai;
mod prompt;

use crate::config::ConfigError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use dummy::DummyScoringClient;
pub use extract::extract_evaluation;
pub use openai::OpenAiScoringClient;
pub use prompt::build_prompt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    #[serde(rename = "role-based")]
    RoleBased,
    #[serde(rename = "personal")]
    Personal,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleBased => "role-based",
            Self::Personal => "personal",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = ConfigError;

    // Unrecognized types are an error, not a silent fallback to personal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role-based" => Ok(Self::RoleBased),
            "personal" => Ok(Self::Personal),
            other => Err(ConfigError::UnknownQuestionType(other.to_owned())),
        }
    }
}

/// Everything the prompt builder needs for one answer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerContext {
    pub question: String,
    pub keywords: Vec<String>,
    pub transcript: String,
    pub question_type: QuestionType,
    pub template_answer: Option<String>,
}

/// Structured record scraped from one model response. Numeric fields are
/// `None` when the label was absent or the value fell outside [0,1]. The
/// keyword fields collapse to `""` when absent; the remaining free-text
/// fields collapse to `None`. Which fields can be populated at all is fixed
/// by the question type.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub relevance_score: Option<f64>,
    pub clarity_score: Option<f64>,
    pub depth_score: Option<f64>,
    pub keywords_coverage_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub experience_score: Option<f64>,
    pub extracted_keywords: String,
    pub matching_keywords: String,
    pub useful_information: Option<String>,
    pub key_strengths: Option<String>,
    pub areas_for_improvement: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("scoring api error: {0}")]
    Api(String),

    #[error("invalid scoring response: {0}")]
    InvalidResponse(String),
}

/// Remote prompt-in/text-out service. Failures are typed values; callers
/// decide whether to skip the answer.
pub trait ScoringClient: Send + Sync {
    fn complete(&self, prompt: String) -> BoxFuture<'_, Result<String, ScoringError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parses_known_values() {
        assert_eq!(
            "role-based".parse::<QuestionType>().unwrap(),
            QuestionType::RoleBased
        );
        assert_eq!(
            "personal".parse::<QuestionType>().unwrap(),
            QuestionType::Personal
        );
    }

    #[test]
    fn question_type_rejects_unknown_value() {
        let err = "behavioral".parse::<QuestionType>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownQuestionType("behavioral".to_owned())
        );
    }

    #[test]
    fn question_type_serde_uses_wire_names() {
        let json = serde_json::to_string(&QuestionType::RoleBased).unwrap();
        assert_eq!(json, "\"role-based\"");
    }
}
