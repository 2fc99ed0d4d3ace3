//! Structuring client: turns extracted invoice text into the model's
//! structured answer.

mod client;

use async_trait::async_trait;

pub use client::{
    LlmClient, LlmConfig, LlmError, LlmProvider, DEFAULT_INVOICE_PROMPT, PROMPT_PLACEHOLDER,
};

/// Result of a structuring request. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuringOutcome {
    /// Model output, passed through unmodified.
    Structured(String),
    /// Why the request failed.
    Failed(String),
}

/// Something that can structure invoice text.
#[async_trait]
pub trait InvoiceStructurer: Send + Sync {
    async fn structure(&self, text: &str) -> StructuringOutcome;
}
