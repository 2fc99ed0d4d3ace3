//! Configuration management for invoice-intake using the prefer crate.
//!
//! Configuration is read once at startup: a config file (explicit path or
//! auto-discovered), then environment overrides, then validation into an
//! immutable [`Settings`] value that is handed to every component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::DocumentKind;
use crate::llm::{LlmConfig, LlmProvider, PROMPT_PLACEHOLDER};

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default maximum upload size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default request timeout covering extraction plus structuring.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Extensions accepted by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "docx"];

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("No API key configured for {provider} (set {hint})")]
    MissingApiKey {
        provider: LlmProvider,
        hint: &'static str,
    },

    #[error("Prompt template must contain the {{invoice_text}} placeholder")]
    MissingPlaceholder,

    #[error("Extension '{0}' has no extraction backend")]
    UnsupportedExtension(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP server section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind: PORT, HOST or HOST:PORT.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Upper bound on a whole upload request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Upload validation section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// OCR section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. "eng" or "eng+deu".
    #[serde(default = "default_ocr_language")]
    pub language: String,
    /// Tesseract binary name or path.
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,
    /// Kill tesseract after this many seconds.
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_tesseract_path() -> String {
    "tesseract".to_string()
}

fn default_ocr_timeout_secs() -> u64 {
    60
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_ocr_language(),
            tesseract_path: default_tesseract_path(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

/// File-level configuration, as written by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    /// Where this config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no config file exists.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load("invoice-intake").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    Self::load_from_path(path).await
                } else {
                    Ok(Self::default())
                }
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the given format ("toml", "yaml"/"yml", anything else is JSON).
    pub fn parse(contents: &str, format: &str) -> Result<Self, ConfigError> {
        match format {
            "toml" => toml::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("TOML: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("YAML: {}", e))),
            _ => serde_json::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("JSON: {}", e))),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `INTAKE_BIND`: server bind address
    /// - `INTAKE_REQUEST_TIMEOUT_SECS`: whole-request timeout
    /// - `INTAKE_MAX_UPLOAD_BYTES`: upload size limit
    /// - `TESSERACT_LANG`, `TESSERACT_PATH`, `TESSERACT_TIMEOUT_SECS`: OCR settings
    /// - `LLM_*` and provider key variables (see [`LlmConfig::with_env_overrides`])
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("INTAKE_BIND") {
            self.server.bind = val;
        }
        if let Some(n) = env_parse("INTAKE_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = n;
        }
        if let Some(n) = env_parse("INTAKE_MAX_UPLOAD_BYTES") {
            self.upload.max_bytes = n;
        }
        if let Ok(val) = std::env::var("TESSERACT_LANG") {
            self.ocr.language = val;
        }
        if let Ok(val) = std::env::var("TESSERACT_PATH") {
            self.ocr.tesseract_path = val;
        }
        if let Some(n) = env_parse("TESSERACT_TIMEOUT_SECS") {
            self.ocr.timeout_secs = n;
        }
        self.llm = self.llm.with_env_overrides();
        self
    }
}

/// Parse an env var, ignoring unset or malformed values.
pub(crate) fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Validated, immutable application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Lowercased extensions, without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub ocr: OcrConfig,
    /// LLM settings with the prompt template already resolved.
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: default_allowed_extensions(),
            ocr: OcrConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Settings {
    /// Validate a loaded config and freeze it.
    ///
    /// Does not require an API key; callers that talk to the model use
    /// [`Settings::require_credentials`].
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        if config.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "upload.max_bytes must be greater than zero".to_string(),
            ));
        }
        if config.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if config.ocr.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "ocr.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut allowed_extensions = Vec::with_capacity(config.upload.allowed_extensions.len());
        for ext in &config.upload.allowed_extensions {
            let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            if DocumentKind::from_extension(&ext) == DocumentKind::Unsupported {
                return Err(ConfigError::UnsupportedExtension(ext));
            }
            if !allowed_extensions.contains(&ext) {
                allowed_extensions.push(ext);
            }
        }
        if allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "upload.allowed_extensions must not be empty".to_string(),
            ));
        }

        let mut llm = config.llm;
        let template = llm.resolve_prompt(config.source_path.as_deref())?;
        llm.prompt = Some(template);
        llm.prompt_file = None;

        Ok(Self {
            bind: config.server.bind,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            max_upload_bytes: config.upload.max_bytes,
            allowed_extensions,
            ocr: config.ocr,
            llm,
        })
    }

    /// Fail unless a hosted-model credential is configured.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        match self.llm.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey {
                provider: self.llm.provider.clone(),
                hint: self.llm.provider.key_env_hint(),
            }),
        }
    }

    /// Check an extension (any case, no dot) against the allow-list.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| *a == ext)
    }
}

/// Load config (explicit path or discovery), apply env overrides and validate.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    Settings::from_config(config.with_env_overrides())
}
