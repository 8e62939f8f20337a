/// LLM Client: the single point of entry for chat-completion calls.
///
/// No other module may call the completion endpoint directly. Speaks the
/// OpenAI-compatible `/chat/completions` protocol; Groq is the default host.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 2000;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    /// Extracts the non-empty text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completion client with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// `timeout` bounds each HTTP attempt, not the retry loop as a whole.
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: MAX_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw completion call, returning the full response object.
    /// Retries on 429 (rate limit), 5xx errors and transport failures with
    /// exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let url = format!("{}/chat/completions", self.base_url);

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            attempt += 1;

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let error = match response {
                Err(e) => LlmError::Http(e),
                Ok(response) => {
                    let status = response.status();

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        warn!("LLM API returned {}: {}", status, body);
                        LlmError::Api {
                            status: status.as_u16(),
                            message: body,
                        }
                    } else if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        let message = serde_json::from_str::<ApiError>(&body)
                            .map(|e| e.error.message)
                            .unwrap_or(body);
                        return Err(LlmError::Api {
                            status: status.as_u16(),
                            message,
                        });
                    } else {
                        let body = response.text().await?;
                        let llm_response: LlmResponse = serde_json::from_str(&body)?;

                        if let Some(usage) = &llm_response.usage {
                            debug!(
                                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                                usage.prompt_tokens, usage.completion_tokens
                            );
                        }

                        return Ok(llm_response);
                    }
                }
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line.
    let stripped = stripped.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(stripped)
}
