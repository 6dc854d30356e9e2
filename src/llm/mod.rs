pub mod models;
pub mod providers;

use crate::config::LlmConfig;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;

/// Failure categories for the relay. Callers branch on the variant; the
/// wire identifier for each category comes from [`LlmError::kind`].
#[derive(Debug)]
pub enum LlmError {
    /// Server-side configuration is incomplete (credential absent, unknown backend).
    Config(String),
    /// The caller supplied a missing or empty prompt.
    InvalidInput(String),
    /// The upstream response did not have the expected choice structure.
    Shape(String),
    /// Network failure or non-success status from the upstream API.
    Upstream(String),
}

impl LlmError {
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Config(_) => "configuration",
            LlmError::InvalidInput(_) => "invalid-input",
            LlmError::Shape(_) => "internal",
            LlmError::Upstream(_) => "unknown",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LlmError::Config(msg)
            | LlmError::InvalidInput(msg)
            | LlmError::Shape(msg)
            | LlmError::Upstream(msg) => msg,
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Config(msg) => write!(f, "LLM configuration error: {}", msg),
            LlmError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            LlmError::Shape(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::Upstream(msg) => write!(f, "LLM upstream error: {}", msg),
        }
    }
}

impl Error for LlmError {}

#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate_sql(&self, prompt: &str) -> Result<String, LlmError>;
}

pub struct LlmManager {
    generator: Box<dyn SqlGenerator + Send + Sync>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let generator: Box<dyn SqlGenerator + Send + Sync> = match config.backend.as_str() {
            "openai" => Box::new(providers::openai::OpenAiProvider::new(config)?),
            _ => {
                return Err(LlmError::Config(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self { generator })
    }

    /// Validates the prompt and issues the one outbound call. An empty
    /// prompt fails here, before the provider is touched.
    pub async fn generate_sql(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidInput(
                "prompt must be a non-empty string".to_string(),
            ));
        }

        self.generator.generate_sql(prompt).await
    }
}
