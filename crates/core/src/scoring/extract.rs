//! Scrapes the model's free-text response back into an [`EvaluationResult`].
//!
//! The response format is effectively a versioned schema: the labels here
//! must match the prompt templates verbatim. Extraction is total; a response
//! missing labels yields a partial record, never an error.

use crate::scoring::{EvaluationResult, QuestionType};
use lazy_static::lazy_static;
use regex::Regex;

const LABEL_RELEVANCE: &str = "Relevance:";
const LABEL_CLARITY: &str = "Clarity:";
const LABEL_DEPTH: &str = "Depth of Information:";
const LABEL_KEYWORDS_COVERAGE: &str = "Keywords Coverage:";
const LABEL_CONFIDENCE: &str = "Confidence:";
const LABEL_EXPERIENCE: &str = "Experience:";
const LABEL_EXTRACTED_KEYWORDS: &str = "Extracted Keywords:";
const LABEL_MATCHING_KEYWORDS: &str = "Matching Keywords:";
const LABEL_ALIGNMENT: &str = "Alignment with Template Answer:";
const LABEL_KEY_STRENGTHS: &str = "Key strengths:";
const LABEL_AREAS_FOR_IMPROVEMENT: &str = "Areas for improvement:";

lazy_static! {
    static ref DECIMAL_RE: Regex = Regex::new(r"[0-9]*\.?[0-9]+").expect("valid regex");
}

/// Pure function from raw response text to a structured record. Never
/// panics; which fields can be populated is fixed by `question_type`.
pub fn extract_evaluation(text: &str, question_type: QuestionType) -> EvaluationResult {
    let mut result = EvaluationResult {
        relevance_score: score_after_label(text, LABEL_RELEVANCE),
        clarity_score: score_after_label(text, LABEL_CLARITY),
        depth_score: score_after_label(text, LABEL_DEPTH),
        extracted_keywords: join_all_after_label(text, LABEL_EXTRACTED_KEYWORDS),
        key_strengths: first_after_label(text, LABEL_KEY_STRENGTHS),
        ..EvaluationResult::default()
    };

    match question_type {
        QuestionType::RoleBased => {
            result.keywords_coverage_score = score_after_label(text, LABEL_KEYWORDS_COVERAGE);
            result.matching_keywords = join_all_after_label(text, LABEL_MATCHING_KEYWORDS);
            result.useful_information = first_after_label(text, LABEL_ALIGNMENT);
            result.areas_for_improvement = first_after_label(text, LABEL_AREAS_FOR_IMPROVEMENT);
        }
        QuestionType::Personal => {
            result.confidence_score = score_after_label(text, LABEL_CONFIDENCE);
            result.experience_score = score_after_label(text, LABEL_EXPERIENCE);
        }
    }

    result
}

/// First decimal on the label's line; out-of-range values count as unparseable.
fn score_after_label(text: &str, label: &str) -> Option<f64> {
    let line = rest_of_line_after(text, label)?;
    let value: f64 = DECIMAL_RE.find(line)?.as_str().parse().ok()?;
    (0.0..=1.0).contains(&value).then_some(value)
}

/// Trimmed remainder of the first line carrying the label, or None.
fn first_after_label(text: &str, label: &str) -> Option<String> {
    rest_of_line_after(text, label).map(|s| s.trim().to_owned())
}

/// All occurrences of the label, line remainders joined with ", ". Empty
/// string when the label never appears.
fn join_all_after_label(text: &str, label: &str) -> String {
    text.match_indices(label)
        .map(|(idx, _)| {
            let rest = &text[idx + label.len()..];
            rest.lines().next().unwrap_or("").trim()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn rest_of_line_after<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let idx = text.find(label)?;
    let rest = &text[idx + label.len()..];
    Some(rest.lines().next().unwrap_or(""))
}
