//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use super::{MessageRequest, MessageResponse, ModelClient};
use crate::error::{Error, Result};

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default timeout for model requests (5 minutes)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for `POST /v1/messages`
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    /// Create a client against the public API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, None)
    }

    /// Create a client, optionally pointing at a proxy or gateway
    pub fn with_base_url(api_key: impl Into<String>, base_url: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or(ANTHROPIC_API_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// Pull the human-readable message out of an API error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Anthropic API request"
        );

        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, model = %request.model, "LLM request failed");
                Error::Provider(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            error!(%status, model = %request.model, "LLM request rejected");
            return Err(Error::Provider(format!("HTTP {}: {}", status, message)));
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Invalid response body: {}", e)))?;

        debug!(
            stop_reason = ?parsed.stop_reason,
            blocks = parsed.content.len(),
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Anthropic API response"
        );

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Message, ToolSpec};
    use serde_json::json;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AnthropicClient::with_base_url("key", Some("http://localhost:8080/")).unwrap();
        assert_eq!(client.messages_url(), "http://localhost:8080/v1/messages");

        let default = AnthropicClient::new("key").unwrap();
        assert_eq!(default.messages_url(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_api_error_message_extraction() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens: must be positive"}}"#;
        assert_eq!(api_error_message(body), "max_tokens: must be positive");
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_request_body_shape() {
        let request = MessageRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1000,
            system: Some("Be brief.".to_string()),
            messages: vec![Message::user("hello")],
            tools: vec![ToolSpec::web_search(None)],
            stop_sequences: vec!["TASK_COMPLETE".to_string()],
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"], json!([{ "role": "user", "content": "hello" }]));
        assert_eq!(body["tools"][0]["type"], "web_search_20250305");
        assert!(body["tools"][0].get("max_uses").is_none());
        assert_eq!(body["stop_sequences"], json!(["TASK_COMPLETE"]));
    }

    #[test]
    fn test_request_body_omits_empty_lists() {
        let request = MessageRequest {
            model: "m".to_string(),
            max_tokens: 10,
            system: None,
            messages: vec![],
            tools: vec![],
            stop_sequences: vec![],
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("stop_sequences").is_none());
        assert!(body.get("system").is_none());
    }
}
