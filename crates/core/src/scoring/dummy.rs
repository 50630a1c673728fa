use crate::scoring::{ScoringClient, ScoringError};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Offline stand-in for the remote model: returns a fixed mid-scale response
/// in the expected label format so downstream extraction still works.
#[derive(Clone)]
pub struct DummyScoringClient;

impl DummyScoringClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyScoringClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringClient for DummyScoringClient {
    fn complete(&self, _prompt: String) -> BoxFuture<'_, Result<String, ScoringError>> {
        async move {
            Ok("**Scoring Matrix**:\n\
                - Relevance: 0.5\n\
                - Clarity: 0.5\n\
                - Depth of Information: 0.5\n\
                - Keywords Coverage: 0.5\n\n\
                **Extracted Information**:\n\
                - Extracted Keywords: none\n\
                - Matching Keywords: none\n\
                - Alignment with Template Answer: not evaluated (offline mode)\n\
                - Key strengths: not evaluated (offline mode)\n\
                - Areas for improvement: not evaluated (offline mode)\n"
                .to_string())
        }
        .boxed()
    }
}
