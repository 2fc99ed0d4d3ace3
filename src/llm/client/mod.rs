//! LLM client for invoice structuring.
//!
//! Supports the Gemini generateContent API and OpenAI-compatible chat
//! completion APIs.

mod config;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use config::{LlmConfig, LlmProvider};
pub use prompts::{DEFAULT_INVOICE_PROMPT, PROMPT_PLACEHOLDER};

use super::{InvoiceStructurer, StructuringOutcome};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to build the client or reach the service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response carried no candidate answer at all
    #[error("Model returned no candidates")]
    Empty,
    /// No credential configured
    #[error("No API key configured for {0}")]
    MissingApiKey(LlmProvider),
}

/// LLM client that turns invoice text into the model's structured answer.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Gemini API request format.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI-compatible chat completion request format.
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

/// OpenAI-compatible chat completion response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Substitute invoice text into the prompt template.
    pub fn build_prompt(&self, text: &str) -> String {
        self.config
            .prompt_template()
            .replace(PROMPT_PLACEHOLDER, text)
    }

    /// Send a single completion request and return the model's text.
    ///
    /// The first candidate's text is returned as-is, even when empty.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(self.config.provider.clone()))?;

        match self.config.provider {
            LlmProvider::Gemini => self.call_gemini(api_key, prompt).await,
            LlmProvider::OpenAI => self.call_openai(api_key, prompt).await,
        }
    }

    /// Call Gemini generateContent with a prompt.
    async fn call_gemini(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let gemini_resp: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if let Some(error) = gemini_resp.error {
            return Err(LlmError::Api(error.message));
        }

        let candidate = gemini_resp
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or(LlmError::Empty)?;

        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Call an OpenAI-compatible chat completions API with a prompt.
    async fn call_openai(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint());
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if let Some(error) = chat_resp.error {
            return Err(LlmError::Api(error.message));
        }

        let choice = chat_resp
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::Empty)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl InvoiceStructurer for LlmClient {
    async fn structure(&self, text: &str) -> StructuringOutcome {
        let prompt = self.build_prompt(text);
        debug!(
            "Structuring {} chars with {} ({})",
            text.len(),
            self.config.model,
            self.config.provider
        );

        match self.complete(&prompt).await {
            Ok(output) => StructuringOutcome::Structured(output),
            Err(e) => {
                warn!("Structuring request failed: {}", e);
                StructuringOutcome::Failed(e.to_string())
            }
        }
    }
}
