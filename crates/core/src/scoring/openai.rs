use crate::config::ScoringConfig;
use crate::scoring::{ScoringClient, ScoringError};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct OpenAiScoringClient {
    client: Client,
    api_key: String,
    base_url: String,
    config: ScoringConfig,
}

impl OpenAiScoringClient {
    pub fn new(api_key: String, config: ScoringConfig) -> Result<Self, ScoringError> {
        // A request timeout bounds the pipeline's exposure to one hung call.
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            config,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ScoringClient for OpenAiScoringClient {
    fn complete(&self, prompt: String) -> BoxFuture<'_, Result<String, ScoringError>> {
        let this = self.clone();
        async move {
            let request = ChatRequest {
                model: this.config.model.clone(),
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                }],
                temperature: this.config.temperature,
                max_tokens: this.config.max_tokens,
            };

            let url = format!("{}/chat/completions", this.base_url);
            let response = this
                .client
                .post(&url)
                .bearer_auth(&this.api_key)
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ScoringError::Api(format!("HTTP {}: {}", status, error_text)));
            }

            let chat_response: ChatResponse = response.json().await.map_err(|e| {
                ScoringError::InvalidResponse(format!("Failed to parse JSON: {}", e))
            })?;

            let choice = chat_response.choices.into_iter().next().ok_or_else(|| {
                ScoringError::InvalidResponse("No choices in response".to_string())
            })?;

            Ok(choice.message.content)
        }
        .boxed()
    }
}
