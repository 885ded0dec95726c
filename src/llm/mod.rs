//! Chat-completion client used by the pipeline stages.
//!
//! Stages depend only on the [`LlmClient`] trait; `main` constructs one
//! [`OpenAiClient`] and passes it into each stage.

mod openai;

pub use openai::{OpenAiClient, OpenAiConfig};

use crate::error::LlmError;
use async_trait::async_trait;

/// A single-round-trip chat completion: system prompt plus user content in,
/// reply text out. No streaming, no retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
