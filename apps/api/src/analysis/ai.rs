use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{coerce::analysis_from_value, prompts, AiError, ResumeAnalysis, ResumeAnalyzer};
use crate::config::AiConfig;
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};

/// Model-backed analyzer. Every call is bounded by a hard timeout that
/// covers retries as well as the individual HTTP attempts.
pub struct AiAnalyzer {
    llm: LlmClient,
    timeout: Duration,
}

impl AiAnalyzer {
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Builds an analyzer from configuration. Without an API key the AI path
    /// is unavailable and callers should run heuristic-only.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = config.api_key.clone().ok_or(AiError::Unavailable)?;
        let llm = LlmClient::new(api_key, &config.base_url, &config.model, config.timeout)
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;
        Ok(Self::new(llm, config.timeout))
    }

    async fn request(&self, text: &str) -> Result<ResumeAnalysis, AiError> {
        let prompt = prompts::build_analysis_prompt(text);
        let response = self
            .llm
            .call(&prompt, prompts::ANALYSIS_SYSTEM)
            .await
            .map_err(|e| match e {
                LlmError::Parse(e) => AiError::ResponseInvalid(e.to_string()),
                other => AiError::RequestFailed(other.to_string()),
            })?;

        let content = response
            .text()
            .ok_or_else(|| AiError::ResponseInvalid("empty completion".to_string()))?;
        parse_analysis_response(content)
    }
}

#[async_trait]
impl ResumeAnalyzer for AiAnalyzer {
    fn name(&self) -> &str {
        self.llm.model()
    }

    async fn analyze(&self, text: &str) -> Result<ResumeAnalysis, AiError> {
        info!(model = self.llm.model(), chars = text.len(), "Requesting AI analysis");

        match tokio::time::timeout(self.timeout, self.request(text)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "AI analysis timed out");
                Err(AiError::RequestFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }
}

/// Parses a completion into an analysis. The reply must be a JSON object,
/// optionally wrapped in markdown fences; individual fields are coerced leniently.
pub fn parse_analysis_response(content: &str) -> Result<ResumeAnalysis, AiError> {
    let value: Value = serde_json::from_str(strip_json_fences(content))
        .map_err(|e| AiError::ResponseInvalid(format!("not valid JSON: {e}")))?;

    let root = value
        .as_object()
        .ok_or_else(|| AiError::ResponseInvalid("expected a JSON object".to_string()))?;

    Ok(analysis_from_value(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyzedBy, ExperienceLevel};
    use crate::llm_client::DEFAULT_MODEL;

    fn completion(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 900, "completion_tokens": 400}
        })
        .to_string()
    }

    fn analyzer(base_url: &str, timeout: Duration) -> AiAnalyzer {
        let llm = LlmClient::new("test-key".to_string(), base_url, DEFAULT_MODEL, timeout)
            .unwrap()
            .with_max_retries(1);
        AiAnalyzer::new(llm, timeout)
    }

    #[test]
    fn test_from_config_without_key_is_unavailable() {
        let config = crate::config::Config::default().ai;
        assert!(config.api_key.is_none());
        assert!(matches!(
            AiAnalyzer::from_config(&config),
            Err(AiError::Unavailable)
        ));
    }

    #[test]
    fn test_parse_rejects_non_object_json() {
        assert!(matches!(
            parse_analysis_response("[1, 2, 3]"),
            Err(AiError::ResponseInvalid(_))
        ));
        assert!(matches!(
            parse_analysis_response("Sure! Here is the analysis you asked for."),
            Err(AiError::ResponseInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let mut server = mockito::Server::new_async().await;
        let body = completion(
            r#"{"summary": "Seasoned Rust engineer.",
                "contactInfo": {"name": "Jane Doe", "email": "jane@example.com"},
                "skills": {"technical": ["Rust", "Go"]},
                "experienceLevel": "senior",
                "analysisScore": 0.9}"#,
        );
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let analysis = analyzer(&server.url(), Duration::from_secs(5))
            .analyze("Jane Doe\nSenior Rust engineer")
            .await
            .unwrap();

        assert_eq!(analysis.summary, "Seasoned Rust engineer.");
        assert_eq!(analysis.contact_info.email.as_deref(), Some("jane@example.com"));
        assert_eq!(analysis.skills.technical, vec!["Rust", "Go"]);
        assert!(analysis.skills.tools.is_empty());
        assert_eq!(analysis.experience_level, ExperienceLevel::Senior);
        assert_eq!(analysis.analyzed_by, AnalyzedBy::Ai);
        assert!(analysis.advisory.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_analyze_accepts_fenced_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion("```json\n{\"keywords\": [\"rust\"]}\n```"))
            .create_async()
            .await;

        let analysis = analyzer(&server.url(), Duration::from_secs(5))
            .analyze("resume")
            .await
            .unwrap();
        assert_eq!(analysis.keywords, vec!["rust"]);
    }

    #[tokio::test]
    async fn test_analyze_auth_failure_is_request_failed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Invalid API Key"}}"#)
            .create_async()
            .await;

        let err = analyzer(&server.url(), Duration::from_secs(5))
            .analyze("resume")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::RequestFailed(ref m) if m.contains("Invalid API Key")));
    }

    #[tokio::test]
    async fn test_analyze_malformed_content_is_response_invalid() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion("{\"summary\": \"cut off mid-"))
            .create_async()
            .await;

        let err = analyzer(&server.url(), Duration::from_secs(5))
            .analyze("resume")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::ResponseInvalid(_)));
    }

    #[tokio::test]
    async fn test_analyze_times_out_when_endpoint_never_answers() {
        // Accepts connections and then stays silent.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = std::time::Instant::now();
        let err = analyzer(&format!("http://{addr}"), Duration::from_millis(200))
            .analyze("resume")
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::RequestFailed(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
