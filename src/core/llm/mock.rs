use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ChatMessage, Generation, TextProvider};

#[derive(Debug, Clone)]
enum ScriptStep {
    Reply(String),
    Fail(String),
}

/// Scripted provider for tests and offline runs. Pops queued steps in order;
/// once the queue is empty it repeats the configured default step.
pub struct MockProvider {
    script: Mutex<VecDeque<ScriptStep>>,
    default_step: ScriptStep,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Always reply with the same text.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_step: ScriptStep::Reply(text.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail, as if the external provider were unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_step: ScriptStep::Fail(message.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue one reply ahead of the default behavior.
    pub async fn push_reply(&self, text: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(ScriptStep::Reply(text.into()));
    }

    /// Queue one failure ahead of the default behavior.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(ScriptStep::Fail(message.into()));
    }

    /// Sleep this long before answering, to exercise timeout paths.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64 / 4).max(1)
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_step.clone());

        match step {
            ScriptStep::Reply(text) => {
                let tokens_in = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
                let tokens_out = estimate_tokens(&text);
                Ok(Generation {
                    text,
                    tokens_in,
                    tokens_out,
                })
            }
            ScriptStep::Fail(message) => Err(anyhow!(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_steps_run_before_the_default() {
        let provider = MockProvider::replying("default");
        provider.push_reply("first").await;
        provider.push_failure("boom").await;

        let msgs = [ChatMessage::user("hi")];
        assert_eq!(provider.generate(&msgs).await.unwrap().text, "first");
        assert!(provider.generate(&msgs).await.is_err());
        assert_eq!(provider.generate(&msgs).await.unwrap().text, "default");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn failing_provider_always_errors() {
        let provider = MockProvider::failing("offline");
        let err = provider
            .generate(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
    }
}
