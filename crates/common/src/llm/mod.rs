//! Text generation service abstraction
//!
//! A generator receives one fully assembled prompt and returns the completion
//! text. Retries and timeouts are applied by the caller.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for single-shot text generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// OpenAI-compatible chat completions client
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl OpenAIGenerator {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let base = config
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationFailure {
                transient: e.is_timeout() || e.is_connect() || e.is_request(),
                message: format!("LLM API request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationFailure {
                message: format!("LLM API error {}: {}", status, body),
                transient: status.is_server_error() || status.as_u16() == 429,
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| AppError::GenerationFailure {
                message: format!("Failed to parse LLM response: {}", e),
                transient: false,
            })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::GenerationFailure {
                message: "Empty response from LLM".to_string(),
                transient: false,
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Offline generator for local development, labels every answer as a mock
pub struct MockGenerator;

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let question = prompt
            .rfind("Question:")
            .map(|start| prompt[start + "Question:".len()..].lines().next().unwrap_or("").trim())
            .unwrap_or("");

        Ok(format!(
            "[Mock response - generation provider not configured] Received {} prompt characters for: {}",
            prompt.chars().count(),
            question
        ))
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}

/// Create a generator based on configuration
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "openai" => {
            let key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
                message: "llm.api_key (or OPENAI_API_KEY) is required for provider 'openai'"
                    .to_string(),
            })?;
            Ok(Arc::new(OpenAIGenerator::new(key, config)?))
        }
        "mock" => Ok(Arc::new(MockGenerator)),
        other => Err(AppError::Configuration {
            message: format!("Unknown llm provider '{}'", other),
        }),
    }
}
