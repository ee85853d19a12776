use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, GeneratorConfig};
use crate::errors::SpecForgeError;
use crate::errors::SpecForgeResult;
use crate::traits::candidate_generator::CandidateGenerator;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },
}

impl From<ChatError> for SpecForgeError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::ApiError(msg) => SpecForgeError::ExternalToolError {
                tool: "LLM API".to_string(),
                message: msg,
            },
            ChatError::ConfigError(err) => SpecForgeError::ConfigError(err.to_string()),
            ChatError::ParseError(msg) => SpecForgeError::GeneratorError(msg),
            ChatError::NetworkError(msg) => SpecForgeError::ExternalToolError {
                tool: "Network".to_string(),
                message: msg,
            },
            ChatError::HttpError { status, message } => SpecForgeError::ExternalToolError {
                tool: "HTTP".to_string(),
                message: format!("Status {}: {}", status, message),
            },
        }
    }
}

/// Chat API request and response types
#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponseChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatResponseChoice>,
}

const SYSTEM_PROMPT: &str = "You generate formal specifications for smart contracts on the \
Ethereum network, written in Solidity, to be checked by the solc-verify verifier.";

/// Base delay for the exponential backoff on transient API failures.
const BACKOFF_BASE: Duration = Duration::from_secs(4);
/// Backoff cap.
const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Candidate generator backed by an OpenAI-compatible chat completions API.
///
/// Keeps the conversation history so feedback prompts land in the same
/// context as the original request; `reset` starts a fresh channel.
/// Transient failures (rate limiting, connectivity, 5xx) are retried with
/// capped exponential backoff before an error reaches the caller.
pub struct ChatCandidateGenerator {
    config: GeneratorConfig,
    http_client: reqwest::Client,
    history: Vec<ChatMessage>,
}

impl ChatCandidateGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
            history: vec![ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            }],
        }
    }

    pub fn new_with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    /// Number of messages in the transcript, the standing system message
    /// included.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    async fn call_api(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self.config.get_api_key()?;
        let api_endpoint = self
            .config
            .api_endpoint
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());
        let model = self
            .config
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o".to_string());

        let request = ChatRequest {
            model,
            messages: messages.to_vec(),
            temperature: self.config.temperature.unwrap_or(0.2),
            max_tokens: self.config.max_tokens.unwrap_or(4096),
        };

        debug!("Sending chat request with {} messages", messages.len());

        let response = self
            .http_client
            .post(&api_endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let error_msg = format!("Network error when calling chat API: {}", e);
                warn!("{}", error_msg);
                ChatError::NetworkError(error_msg)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error message".to_string());
            warn!("API error: HTTP {} - {}", status, message);
            return Err(ChatError::HttpError { status, message });
        }

        let response_json: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let choice = response_json
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::ApiError("No response from API".to_string()))?;

        debug!(
            "Received response with {} characters",
            choice.message.content.len()
        );
        Ok(choice.message.content)
    }

    /// Retry transient failures with capped exponential backoff.
    async fn call_api_with_backoff(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let max_retries = self.config.max_retries.unwrap_or(5);
        let mut delay = BACKOFF_BASE;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.call_api(messages).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < max_retries && is_transient(&e) => {
                    warn!(
                        "Transient API failure (attempt {}/{}): {}. Retrying in {}s",
                        attempt,
                        max_retries,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(BACKOFF_MAX);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_transient(error: &ChatError) -> bool {
    match error {
        ChatError::NetworkError(_) => true,
        ChatError::HttpError { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl CandidateGenerator for ChatCandidateGenerator {
    async fn send(&mut self, prompt: &str) -> SpecForgeResult<String> {
        let mut messages = self.history.clone();
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        // The turn is committed to the transcript only once it has an
        // answer; a send that fails after all retries must not leave a
        // dangling user message for the next prompt.
        let content = self.call_api_with_backoff(&messages).await?;

        self.history = messages;
        self.history.push(ChatMessage {
            role: "assistant".to_string(),
            content: content.clone(),
        });

        info!("Generator round trip complete ({} chars)", content.len());
        Ok(content)
    }

    fn reset(&mut self) {
        self.history.truncate(1);
    }
}
