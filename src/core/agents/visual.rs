use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Agent, AgentContext, AgentRunResult, DraftAsset, extract_json_object, generate_or_none};
use crate::core::llm::{ChatMessage, TextProvider};
use crate::core::store::types::AssetKind;

/// Produces an image-generation prompt spec (JSON) for the campaign's hero
/// visual.
pub struct VisualAgent {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl VisualAgent {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn fallback_spec(ctx: &AgentContext) -> serde_json::Value {
        json!({
            "prompt": format!(
                "Hero image for \"{}\": {}. Clean composition, brand-forward.",
                ctx.title, ctx.objective
            ),
            "style": ctx.brand_voice,
            "aspect_ratio": "16:9",
            "negative_prompt": "text, watermarks, clutter",
        })
    }
}

#[async_trait]
impl Agent for VisualAgent {
    fn name(&self) -> &'static str {
        "visual"
    }

    async fn run(&self, ctx: &AgentContext) -> Result<AgentRunResult> {
        let started = Instant::now();
        let messages = [
            ChatMessage::system(
                "You design image-generation prompts. Reply with a single JSON object with keys \
                 prompt, style, aspect_ratio, negative_prompt.",
            ),
            ChatMessage::user(format!(
                "Campaign: \"{}\". Objective: {}. Audience: {}. Brand voice: {}.",
                ctx.title, ctx.objective, ctx.audience, ctx.brand_voice
            )),
        ];

        let mut tokens = (0u64, 0u64);
        let generation =
            generate_or_none(&self.provider, self.timeout, self.name(), &messages).await;

        let (spec, fallback) = match generation {
            Some(generation) => {
                tokens = (generation.tokens_in, generation.tokens_out);
                match extract_json_object(&generation.text) {
                    Some(spec) => (spec, false),
                    None => (Self::fallback_spec(ctx), true),
                }
            }
            None => (Self::fallback_spec(ctx), true),
        };

        let asset = DraftAsset {
            kind: AssetKind::ImagePrompt,
            title: format!("{} — hero image prompt", ctx.title),
            body: serde_json::to_string_pretty(&spec)?,
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
            brand_voice: "minimal".to_string(),
            channels: vec![],
            target_length: None,
        }
    }

    #[tokio::test]
    async fn produces_one_image_prompt_asset() {
        let agent = VisualAgent::new(
            Arc::new(MockProvider::replying(
                r#"{"prompt": "p", "style": "s", "aspect_ratio": "1:1", "negative_prompt": "n"}"#,
            )),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        assert_eq!(result.assets.len(), 1);
        assert_eq!(result.assets[0].kind, AssetKind::ImagePrompt);
        assert_eq!(result.assets[0].metadata["fallback"], false);
    }

    #[tokio::test]
    async fn fallback_spec_substitutes_the_brief() {
        let agent = VisualAgent::new(
            Arc::new(MockProvider::failing("down")),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        let spec: serde_json::Value = serde_json::from_str(&result.assets[0].body).unwrap();
        assert!(spec["prompt"].as_str().unwrap().contains("Launch"));
        assert_eq!(spec["style"], "minimal");
        assert_eq!(result.assets[0].metadata["fallback"], true);
    }
}
