use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Agent, AgentContext, AgentRunResult, DraftAsset, extract_json_object, generate_or_none};
use crate::core::llm::{ChatMessage, TextProvider};
use crate::core::store::types::AssetKind;

/// Produces a structured short-video script with timed sections.
pub struct VideoAgent {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl VideoAgent {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn fallback_script(ctx: &AgentContext) -> serde_json::Value {
        json!({
            "sections": [
                {
                    "name": "hook",
                    "start_s": 0,
                    "end_s": 5,
                    "voiceover": format!("What if {}?", ctx.objective),
                    "visual": "bold title card",
                },
                {
                    "name": "problem",
                    "start_s": 5,
                    "end_s": 20,
                    "voiceover": format!("{} know the pain.", ctx.audience),
                    "visual": "relatable scene",
                },
                {
                    "name": "solution",
                    "start_s": 20,
                    "end_s": 45,
                    "voiceover": format!("Meet {}.", ctx.title),
                    "visual": "product walkthrough",
                },
                {
                    "name": "cta",
                    "start_s": 45,
                    "end_s": 60,
                    "voiceover": "Try it today.",
                    "visual": "logo and link",
                },
            ],
        })
    }
}

#[async_trait]
impl Agent for VideoAgent {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn run(&self, ctx: &AgentContext) -> Result<AgentRunResult> {
        let started = Instant::now();
        let messages = [
            ChatMessage::system(
                "You write short-form video scripts. Reply with a single JSON object with a \
                 sections array; each section has name, start_s, end_s, voiceover, visual.",
            ),
            ChatMessage::user(format!(
                "Script a 60-second video for \"{}\". Objective: {}. Audience: {}. Voice: {}.",
                ctx.title, ctx.objective, ctx.audience, ctx.brand_voice
            )),
        ];

        let mut tokens = (0u64, 0u64);
        let generation =
            generate_or_none(&self.provider, self.timeout, self.name(), &messages).await;

        // A script without a sections array is unusable output.
        let (script, fallback) = match generation {
            Some(generation) => {
                tokens = (generation.tokens_in, generation.tokens_out);
                match extract_json_object(&generation.text)
                    .filter(|value| value["sections"].is_array())
                {
                    Some(script) => (script, false),
                    None => (Self::fallback_script(ctx), true),
                }
            }
            None => (Self::fallback_script(ctx), true),
        };

        let asset = DraftAsset {
            kind: AssetKind::VideoScript,
            title: format!("{} — video script", ctx.title),
            body: serde_json::to_string_pretty(&script)?,
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
            channels: vec![],
            target_length: None,
        }
    }

    #[tokio::test]
    async fn script_with_sections_is_accepted() {
        let agent = VideoAgent::new(
            Arc::new(MockProvider::replying(
                r#"{"sections": [{"name": "hook", "start_s": 0, "end_s": 5, "voiceover": "v", "visual": "x"}]}"#,
            )),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        assert_eq!(result.assets[0].kind, AssetKind::VideoScript);
        assert_eq!(result.assets[0].metadata["fallback"], false);
    }

    #[tokio::test]
    async fn json_without_sections_falls_back() {
        let agent = VideoAgent::new(
            Arc::new(MockProvider::replying(r#"{"title": "nope"}"#)),
            Duration::from_secs(5),
        );
        let result = agent.run(&ctx()).await.unwrap();
        assert_eq!(result.assets[0].metadata["fallback"], true);

        let script: serde_json::Value = serde_json::from_str(&result.assets[0].body).unwrap();
        let sections = script["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0]["name"], "hook");
        assert_eq!(sections[3]["end_s"], 60);
    }
}
