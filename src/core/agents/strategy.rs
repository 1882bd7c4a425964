use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Agent, AgentContext, AgentRunResult, DraftAsset, extract_json_object, generate_or_none};
use crate::core::llm::{ChatMessage, TextProvider};
use crate::core::store::types::AssetKind;

/// Produces the messaging brief the rest of the chain builds on: one
/// JSON-shaped asset with positioning, key messages, tone, and call to action.
pub struct StrategyAgent {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl StrategyAgent {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn fallback_brief(ctx: &AgentContext) -> serde_json::Value {
        json!({
            "positioning": format!("{} — {}", ctx.title, ctx.objective),
            "key_messages": [
                format!("Built for {}", ctx.audience),
                ctx.objective,
            ],
            "tone": ctx.brand_voice,
            "call_to_action": "Learn more",
        })
    }
}

#[async_trait]
impl Agent for StrategyAgent {
    fn name(&self) -> &'static str {
        "strategy"
    }

    async fn run(&self, ctx: &AgentContext) -> Result<AgentRunResult> {
        let started = Instant::now();
        let messages = [
            ChatMessage::system(
                "You are a marketing strategist. Reply with a single JSON object with keys \
                 positioning, key_messages (array), tone, call_to_action.",
            ),
            ChatMessage::user(format!(
                "Campaign: \"{}\". Objective: {}. Audience: {}. Brand voice: {}. Channels: {}.",
                ctx.title,
                ctx.objective,
                ctx.audience,
                ctx.brand_voice,
                ctx.channels.join(", ")
            )),
        ];

        let mut tokens = (0u64, 0u64);
        let generation =
            generate_or_none(&self.provider, self.timeout, self.name(), &messages).await;

        // Unparseable provider output counts as unusable and falls back too.
        let (brief, fallback) = match generation {
            Some(generation) => {
                tokens = (generation.tokens_in, generation.tokens_out);
                match extract_json_object(&generation.text) {
                    Some(brief) => (brief, false),
                    None => (Self::fallback_brief(ctx), true),
                }
            }
            None => (Self::fallback_brief(ctx), true),
        };

        let asset = DraftAsset {
            kind: AssetKind::Strategy,
            title: format!("{} — messaging brief", ctx.title),
            body: serde_json::to_string_pretty(&brief)?,
            metadata: json!({"format": "json", "fallback": fallback}),
        };

        Ok(AgentRunResult {
            assets: vec![asset],
            tokens_in: tokens.0,
            tokens_out: tokens.1,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::MockProvider;

    fn ctx() -> AgentContext {
        AgentContext {
            title: "Launch".to_string(),
            objective: "Announce".to_string(),
            audience: "founders".to_string(),
            brand_voice: "bold".to_string(),
            channels: vec!["blog".to_string()],
            target_length: None,
        }
    }

    #[tokio::test]
    async fn valid_provider_json_becomes_the_brief() {
        let agent = StrategyAgent::new(
            Arc::new(MockProvider::replying(
                r#"{"positioning": "p", "key_messages": ["a"], "tone": "t", "call_to_action": "c"}"#,
            )),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        assert_eq!(result.assets.len(), 1);
        let brief: serde_json::Value = serde_json::from_str(&result.assets[0].body).unwrap();
        assert_eq!(brief["positioning"], "p");
        assert_eq!(result.assets[0].metadata["fallback"], false);
    }

    #[tokio::test]
    async fn malformed_provider_output_falls_back() {
        let agent = StrategyAgent::new(
            Arc::new(MockProvider::replying("sorry, I can't do JSON today")),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        let brief: serde_json::Value = serde_json::from_str(&result.assets[0].body).unwrap();
        assert_eq!(brief["tone"], "bold");
        assert_eq!(result.assets[0].metadata["fallback"], true);
    }

    #[tokio::test]
    async fn provider_failure_falls_back() {
        let agent = StrategyAgent::new(
            Arc::new(MockProvider::failing("down")),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        assert_eq!(result.assets.len(), 1);
        assert_eq!(result.assets[0].metadata["fallback"], true);
        assert_eq!(result.tokens_in, 0);
    }
}
