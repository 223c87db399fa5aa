//! OpenAI chat-completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use super::{TopicSource, build_prompt, format_for_thermal_print};
use crate::error::{PromptslipError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";
pub const MAX_TOKENS: u32 = 800;
pub const TEMPERATURE: f32 = 0.7;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pull `error.message` out of an API error body, or return it trimmed.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// `{base_url}/v1/chat/completions`, keeping any path prefix on the base.
fn completions_url(base_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("v1/chat/completions")
}

/// Topic source backed by `POST /v1/chat/completions`.
pub struct OpenAiTopicSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiTopicSource {
    /// Build a client. Fails when no API key is configured.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PromptslipError::Config(
                    "OPENAI_API_KEY is required for topic generation".to_string(),
                )
            })?;

        let endpoint = completions_url(&config.base_url).map_err(|e| {
                PromptslipError::Config(format!("Invalid API base URL '{}': {}", config.base_url, e))
            })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("promptslip/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| PromptslipError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.model,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PromptslipError::TopicSource(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PromptslipError::TopicSource(format!(
                "API returned {}: {}",
                status,
                api_error_message(&body)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PromptslipError::TopicSource(format!("Invalid API response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| PromptslipError::TopicSource("API returned no content".to_string()))
    }
}

#[async_trait]
impl TopicSource for OpenAiTopicSource {
    async fn generate_topics(
        &self,
        user_hint: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String> {
        let prompt = build_prompt(user_hint, system_prompt);
        debug!(prompt = %prompt, "Built topic prompt");
        info!(model = %self.model, "Requesting conversation topics");

        match self.complete(&prompt).await {
            Ok(text) => {
                info!("Generated conversation topics");
                Ok(format_for_thermal_print(&text))
            }
            Err(e) => {
                error!(error = %e, "Topic generation failed");
                Err(e)
            }
        }
    }
}
