//! LLM client configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::prompts::{DEFAULT_INVOICE_PROMPT, PROMPT_PLACEHOLDER};
use crate::config::{env_parse, ConfigError};

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini generateContent API (default)
    #[default]
    Gemini,
    /// OpenAI-compatible chat completions API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
        }
    }

    /// Endpoint used when none is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::OpenAI => "https://api.openai.com",
        }
    }

    /// Env vars consulted for this provider's key, for error messages.
    pub fn key_env_hint(&self) -> &'static str {
        match self {
            Self::Gemini => "GOOGLE_API_KEY, GEMINI_API_KEY or LLM_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY, GROQ_API_KEY or LLM_API_KEY",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the structuring LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (gemini or openai)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key; never written back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation; low favors deterministic output
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP timeout for a single completion request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Inline prompt template (uses the {invoice_text} placeholder)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Prompt template file, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<PathBuf>,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: None,
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            prompt: None,
            prompt_file: None,
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "gemini" (default), "openai", "groq", or "together"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key for any provider
    /// - `GOOGLE_API_KEY` / `GEMINI_API_KEY`: Gemini key
    /// - `OPENAI_API_KEY` / `GROQ_API_KEY`: OpenAI-compatible key
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature
    /// - `LLM_TIMEOUT_SECS`: HTTP timeout
    /// - `LLM_PROMPT`: Inline prompt template
    /// - `LLM_PROMPT_FILE`: Prompt template file
    ///
    /// `LLM_API_KEY` always wins; provider-specific keys only fill an unset key.
    pub fn with_env_overrides(mut self) -> Self {
        let explicit_provider = std::env::var("LLM_PROVIDER").ok();
        if let Some(provider) = explicit_provider.as_deref().and_then(LlmProvider::from_str) {
            self.provider = provider;
        }

        if let Ok(endpoint) = std::env::var("LLM_ENDPOINT") {
            self.endpoint = Some(endpoint);
        } else if self.endpoint.is_none() {
            match explicit_provider.as_deref().map(|p| p.to_lowercase()).as_deref() {
                Some("groq") => self.endpoint = Some("https://api.groq.com/openai".to_string()),
                Some("together") => self.endpoint = Some("https://api.together.xyz".to_string()),
                _ => {}
            }
        }

        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        }
        if self.api_key.is_none() {
            let candidates: &[&str] = match self.provider {
                LlmProvider::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
                LlmProvider::OpenAI => &["OPENAI_API_KEY", "GROQ_API_KEY"],
            };
            self.api_key = candidates.iter().find_map(|name| std::env::var(name).ok());
        }

        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = val;
        }
        if let Some(n) = env_parse("LLM_MAX_TOKENS") {
            self.max_tokens = n;
        }
        if let Some(t) = env_parse("LLM_TEMPERATURE") {
            self.temperature = t;
        }
        if let Some(n) = env_parse("LLM_TIMEOUT_SECS") {
            self.timeout_secs = n;
        }
        if let Ok(val) = std::env::var("LLM_PROMPT") {
            self.prompt = Some(val);
        }
        if let Ok(val) = std::env::var("LLM_PROMPT_FILE") {
            self.prompt_file = Some(PathBuf::from(val));
        }
        self
    }

    /// Get the endpoint, using the provider default when unset.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Get the prompt template, using custom or default.
    pub fn prompt_template(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_INVOICE_PROMPT)
    }

    /// Resolve the template from inline prompt, prompt file or default,
    /// and check that it carries the placeholder.
    ///
    /// A relative `prompt_file` is resolved against the directory of
    /// `config_path` when one is given.
    pub fn resolve_prompt(&self, config_path: Option<&Path>) -> Result<String, ConfigError> {
        let template = if let Some(ref prompt) = self.prompt {
            prompt.clone()
        } else if let Some(ref file) = self.prompt_file {
            let path = match config_path.and_then(Path::parent) {
                Some(base) if file.is_relative() => base.join(file),
                _ => file.clone(),
            };
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?
        } else {
            DEFAULT_INVOICE_PROMPT.to_string()
        };

        if !template.contains(PROMPT_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder);
        }
        Ok(template)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}
