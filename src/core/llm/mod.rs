mod mock;
mod openai;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
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

/// One completed text generation, with the provider's usage accounting.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
}

/// Opaque external text-generation provider. Agents hold one behind an Arc
/// and treat every call as fallible, blocking I/O.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation>;
}
