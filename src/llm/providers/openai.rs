use crate::config::LlmConfig;
use crate::llm::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::llm::{LlmError, SqlGenerator};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a SQL expert. Generate SQL code based on \
the following description of tables. The code must be clean, readable and \
compatible with MySQL.";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::Config("OpenAI API key is not configured on the server".to_string())
        })?;

        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SqlGenerator for OpenAiProvider {
    async fn generate_sql(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        debug!("Sending chat-completion request with model: {}", self.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Capture the upstream error payload for diagnostics
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("OpenAI API responded with status code: {}{}", status, error_body);
            return Err(LlmError::Upstream(format!(
                "API responded with status code: {}{}",
                status, error_body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Shape(e.to_string()))?;

        let content = match completion.choices.first() {
            Some(choice) => &choice.message.content,
            None => {
                return Err(LlmError::Shape(
                    "Upstream response did not have the expected format".to_string(),
                ))
            }
        };

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(&LlmConfig {
            backend: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key: Some("test-key".to_string()),
            api_url: Some(server.url("/v1/chat/completions")),
        })
        .unwrap()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let result = OpenAiProvider::new(&LlmConfig {
            backend: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            api_url: None,
        });

        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[tokio::test]
    async fn test_generate_sql_trims_first_choice() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer test-key")
                .header("Content-Type", "application/json")
                .json_body_partial(r#"{"model": "gpt-4"}"#);
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"content": "  SELECT 1;  "}}]
            }));
        });

        let provider = provider_for(&server);
        let sql = provider.generate_sql("one row with value 1").await.unwrap();

        mock.assert();
        assert_eq!(sql, "SELECT 1;");
    }

    #[tokio::test]
    async fn test_request_carries_system_and_user_messages() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(
                    r#"{"messages": [{"role": "system"}, {"role": "user", "content": "count the orders"}]}"#,
                );
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"content": "SELECT COUNT(*) FROM orders;"}}]
            }));
        });

        let provider = provider_for(&server);
        let sql = provider.generate_sql("count the orders").await.unwrap();

        mock.assert();
        assert_eq!(sql, "SELECT COUNT(*) FROM orders;");
    }

    #[tokio::test]
    async fn test_empty_choices_is_shape_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(serde_json::json!({ "choices": [] }));
        });

        let provider = provider_for(&server);
        let result = provider.generate_sql("anything").await;

        assert!(matches!(result, Err(LlmError::Shape(_))));
    }

    #[tokio::test]
    async fn test_error_status_carries_upstream_body() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429)
                .body(r#"{"error": {"message": "quota exceeded"}}"#);
        });

        let provider = provider_for(&server);
        let result = provider.generate_sql("anything").await;

        match result {
            Err(LlmError::Upstream(msg)) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("quota exceeded"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        // Nothing listens here; the connection is refused immediately
        let provider = OpenAiProvider::new(&LlmConfig {
            backend: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key: Some("test-key".to_string()),
            api_url: Some("http://127.0.0.1:1/v1/chat/completions".to_string()),
        })
        .unwrap();

        let result = provider.generate_sql("anything").await;

        match result {
            Err(LlmError::Upstream(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
