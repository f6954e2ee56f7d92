use crate::config::Config;
use crate::error::{Result, TranslateError};
use crate::usage::TokenUsage;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Text of a single completion plus the tokens it cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

/// The one operation the engine needs from a chat model: role-tagged
/// messages in, one completion out.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete_chat(&self, messages: &[ChatMessage]) -> Result<ChatCompletion>;
}

/// Resolve the chat completions URL from either an API base
/// (`https://api.openai.com/v1`) or a full endpoint URL.
pub fn chat_completions_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else {
        format!("{}/chat/completions", endpoint)
    }
}

/// OpenAI-compatible chat completion client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// Fails fast with a configuration error when the credential is missing or
    /// the endpoint is not a valid URL.
    pub fn new(config: &Config) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(TranslateError::Configuration(
                "OPENAI_API_KEY is empty".to_string(),
            ));
        }

        let url = chat_completions_url(&config.openai_api_url);
        reqwest::Url::parse(&url).map_err(|e| {
            TranslateError::Configuration(format!("Invalid API endpoint '{}': {}", url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                TranslateError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            url,
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatService for OpenAiClient {
    async fn complete_chat(&self, messages: &[ChatMessage]) -> Result<ChatCompletion> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TranslateError::Configuration(format!(
                "API key rejected by {} ({}): {}",
                self.url,
                status.as_u16(),
                body
            )));
        }

        if !status.is_success() {
            return Err(TranslateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            TranslateError::MalformedResponse(format!("Failed to parse chat response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                TranslateError::MalformedResponse("Chat response contained no choices".to_string())
            })?;

        Ok(ChatCompletion {
            content,
            usage: chat_response.usage.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_test_config(api_url: &str) -> Config {
        Config {
            openai_api_key: "test-openai-key".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_api_url: api_url.to_string(),
            temperature: 0.3,
            batch_size: 10,
            request_timeout_secs: 5,
        }
    }

    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }
            ],
            "usage": {
                "prompt_tokens": 100,
                "completion_tokens": 50,
                "total_tokens": 150
            }
        })
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("You translate."), ChatMessage::user("[\"Hello\"]")]
    }

    // ==================== URL Tests ====================

    #[test]
    fn test_chat_completions_url_from_base() {
        assert_eq!(
            chat_completions_url("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_completions_url_already_full() {
        assert_eq!(
            chat_completions_url("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_empty_key() {
        let mut config = create_test_config("https://api.openai.com/v1");
        config.openai_api_key = "   ".to_string();
        let err = OpenAiClient::new(&config).unwrap_err();
        assert!(matches!(err, TranslateError::Configuration(_)));
    }

    #[test]
    fn test_new_rejects_invalid_endpoint() {
        let config = create_test_config("not a url");
        let err = OpenAiClient::new(&config).unwrap_err();
        assert!(matches!(err, TranslateError::Configuration(_)));
    }

    #[test]
    fn test_new_resolves_url() {
        let client = OpenAiClient::new(&create_test_config("https://example.com/v1")).unwrap();
        assert_eq!(client.url(), "https://example.com/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    // ==================== Serialization Tests ====================

    #[test]
    fn test_chat_request_serialization() {
        let messages = messages();
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.3,
        };

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(json.contains("gpt-4o-mini"));
        assert!(json.contains("\"role\":\"system\""));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("0.3"));
    }

    #[test]
    fn test_chat_response_without_usage() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).expect("Should deserialize");
        assert!(response.usage.is_none());
        assert_eq!(response.choices[0].message.content.as_deref(), Some("[]"));
    }

    // ==================== complete_chat Tests with Wiremock ====================

    #[tokio::test]
    async fn test_complete_chat_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-openai-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response("[\"Bonjour\"]")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1", mock_server.uri()));
        let client = OpenAiClient::new(&config).unwrap();

        let completion = client.complete_chat(&messages()).await.expect("Should succeed");
        assert_eq!(completion.content, "[\"Bonjour\"]");
        assert_eq!(completion.usage, TokenUsage::new(100, 50, 150));
    }

    #[tokio::test]
    async fn test_complete_chat_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(504).set_body_string("Gateway Timeout"))
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1", mock_server.uri()));
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.complete_chat(&messages()).await.unwrap_err();
        assert!(matches!(err, TranslateError::Api { status: 504, .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Gateway Timeout"));
    }

    #[tokio::test]
    async fn test_complete_chat_unauthorized_is_configuration_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1", mock_server.uri()));
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.complete_chat(&messages()).await.unwrap_err();
        assert!(matches!(err, TranslateError::Configuration(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_complete_chat_bad_request_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1", mock_server.uri()));
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.complete_chat(&messages()).await.unwrap_err();
        assert!(matches!(err, TranslateError::Api { status: 400, .. }));
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_complete_chat_empty_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1", mock_server.uri()));
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.complete_chat(&messages()).await.unwrap_err();
        assert!(matches!(err, TranslateError::MalformedResponse(_)));
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn test_complete_chat_invalid_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1", mock_server.uri()));
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.complete_chat(&messages()).await.unwrap_err();
        assert!(matches!(err, TranslateError::MalformedResponse(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_complete_chat_connection_refused_is_transport_error() {
        // Nothing listens on port 9 of localhost in the test environment
        let config = create_test_config("http://127.0.0.1:9/v1");
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.complete_chat(&messages()).await.unwrap_err();
        assert!(matches!(err, TranslateError::Transport(_)));
        assert!(err.is_retryable());
    }
}
