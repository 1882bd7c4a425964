use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Agent, AgentContext, AgentRunResult, DraftAsset, generate_or_none};
use crate::core::llm::{ChatMessage, TextProvider};
use crate::core::store::types::AssetKind;

/// Audience segments each campaign gets an email variant for.
const SEGMENTS: [(&str, &str); 3] = [
    ("new_prospects", "people who have never heard of the product"),
    ("engaged_leads", "people who tried the product but have not converted"),
    ("loyal_customers", "long-time customers who may want the upgrade"),
];

/// Produces one email variant per audience segment.
pub struct PersonalizeAgent {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl PersonalizeAgent {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn fallback_variant(ctx: &AgentContext, segment: &str, description: &str) -> String {
        format!(
            "Subject: {} — for {}\n\nHi,\n\nWe made something for {}: {}.\n\nBest,\nThe team",
            ctx.title,
            segment.replace('_', " "),
            description,
            ctx.objective
        )
    }
}

#[async_trait]
impl Agent for PersonalizeAgent {
    fn name(&self) -> &'static str {
        "personalize"
    }

    async fn run(&self, ctx: &AgentContext) -> Result<AgentRunResult> {
        let started = Instant::now();
        let mut tokens = (0u64, 0u64);
        let mut assets = Vec::with_capacity(SEGMENTS.len());

        for (segment, description) in SEGMENTS {
            let messages = [
                ChatMessage::system(format!(
                    "You personalize marketing emails. Brand voice: {}.",
                    ctx.brand_voice
                )),
                ChatMessage::user(format!(
                    "Write an email for the campaign \"{}\" tailored to {} ({}). Objective: {}. \
                     Include a subject line on the first line.",
                    ctx.title, segment, description, ctx.objective
                )),
            ];

            let (body, fallback) =
                match generate_or_none(&self.provider, self.timeout, self.name(), &messages).await
                {
                    Some(generation) => {
                        tokens.0 += generation.tokens_in;
                        tokens.1 += generation.tokens_out;
                        (generation.text.trim().to_string(), false)
                    }
                    None => (Self::fallback_variant(ctx, segment, description), true),
                };

            assets.push(DraftAsset {
                kind: AssetKind::Email,
                title: format!("{} — {}", ctx.title, segment.replace('_', " ")),
                body,
                metadata: json!({
                    "channel": "email",
                    "segment": segment,
                    "personalized": true,
                    "fallback": fallback,
                }),
            });
        }

        Ok(AgentRunResult {
            assets,
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
            brand_voice: "warm".to_string(),
            channels: vec![],
            target_length: None,
        }
    }

    #[tokio::test]
    async fn produces_one_variant_per_segment() {
        let provider = Arc::new(MockProvider::replying("Subject: hi\n\nbody"));
        let agent = PersonalizeAgent::new(provider.clone(), Duration::from_secs(5));
        let result = agent.run(&ctx()).await.unwrap();

        assert_eq!(result.assets.len(), 3);
        let segments: Vec<&str> = result
            .assets
            .iter()
            .map(|a| a.metadata["segment"].as_str().unwrap())
            .collect();
        assert_eq!(
            segments,
            vec!["new_prospects", "engaged_leads", "loyal_customers"]
        );
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn partial_provider_failure_still_covers_every_segment() {
        let provider = Arc::new(MockProvider::replying("Subject: ok\n\nbody"));
        provider.push_failure("blip").await;
        let agent = PersonalizeAgent::new(provider, Duration::from_secs(5));
        let result = agent.run(&ctx()).await.unwrap();

        assert_eq!(result.assets.len(), 3);
        assert_eq!(result.assets[0].metadata["fallback"], true);
        assert_eq!(result.assets[1].metadata["fallback"], false);
    }
}
