use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Agent, AgentContext, AgentRunResult, DraftAsset, generate_or_none};
use crate::core::llm::{ChatMessage, TextProvider};
use crate::core::publish::{clip_to_ceiling, platform_ceiling};
use crate::core::store::types::AssetKind;

/// Social platforms the copy agent drafts variants for when the campaign
/// requests the `social` channel.
const SOCIAL_PLATFORMS: [&str; 2] = ["twitter", "linkedin"];

/// Drafts blog, email, and social copy for whichever channels the campaign
/// brief requested. Social variants are clipped to each destination's
/// character ceiling at creation time.
pub struct CopyAgent {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl CopyAgent {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn system_prompt(ctx: &AgentContext) -> ChatMessage {
        ChatMessage::system(format!(
            "You are a marketing copywriter. Brand voice: {}. Audience: {}.",
            ctx.brand_voice, ctx.audience
        ))
    }

    async fn draft(
        &self,
        ctx: &AgentContext,
        instruction: String,
        tokens: &mut (u64, u64),
    ) -> Option<String> {
        let messages = [Self::system_prompt(ctx), ChatMessage::user(instruction)];
        let generation =
            generate_or_none(&self.provider, self.timeout, self.name(), &messages).await?;
        tokens.0 += generation.tokens_in;
        tokens.1 += generation.tokens_out;
        let text = generation.text.trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl Agent for CopyAgent {
    fn name(&self) -> &'static str {
        "copy"
    }

    async fn run(&self, ctx: &AgentContext) -> Result<AgentRunResult> {
        let started = Instant::now();
        let mut tokens = (0u64, 0u64);
        let mut assets = Vec::new();

        if ctx.wants_channel("blog") {
            let length_hint = ctx
                .target_length
                .map(|words| format!(" Target roughly {} words.", words))
                .unwrap_or_default();
            let instruction = format!(
                "Write a blog post for the campaign \"{}\". Objective: {}.{}",
                ctx.title, ctx.objective, length_hint
            );
            let (body, fallback) = match self.draft(ctx, instruction, &mut tokens).await {
                Some(text) => (text, false),
                None => (
                    format!(
                        "# {}\n\n{}\n\nThis post is for {}. More detail is on the way — \
                         our team is expanding this draft.",
                        ctx.title, ctx.objective, ctx.audience
                    ),
                    true,
                ),
            };
            assets.push(DraftAsset {
                kind: AssetKind::Blog,
                title: ctx.title.clone(),
                body,
                metadata: json!({"channel": "blog", "fallback": fallback}),
            });
        }

        if ctx.wants_channel("email") {
            let instruction = format!(
                "Write a marketing email for the campaign \"{}\". Objective: {}. \
                 Include a subject line on the first line.",
                ctx.title, ctx.objective
            );
            let (body, fallback) = match self.draft(ctx, instruction, &mut tokens).await {
                Some(text) => (text, false),
                None => (
                    format!(
                        "Subject: {}\n\nHi there,\n\n{}\n\nBest,\nThe team",
                        ctx.title, ctx.objective
                    ),
                    true,
                ),
            };
            assets.push(DraftAsset {
                kind: AssetKind::Email,
                title: format!("{} — email", ctx.title),
                body,
                metadata: json!({"channel": "email", "fallback": fallback}),
            });
        }

        if ctx.wants_channel("social") {
            for platform in SOCIAL_PLATFORMS {
                let ceiling = platform_ceiling(platform);
                let limit_hint = ceiling
                    .map(|c| format!(" Stay under {} characters.", c))
                    .unwrap_or_default();
                let instruction = format!(
                    "Write a {} post announcing \"{}\". Objective: {}.{}",
                    platform, ctx.title, ctx.objective, limit_hint
                );
                let (body, fallback) = match self.draft(ctx, instruction, &mut tokens).await {
                    Some(text) => (text, false),
                    None => (format!("{} — {}", ctx.title, ctx.objective), true),
                };
                let body = match ceiling {
                    Some(ceiling) => clip_to_ceiling(&body, ceiling),
                    None => body,
                };
                assets.push(DraftAsset {
                    kind: AssetKind::Social,
                    title: format!("{} — {}", ctx.title, platform),
                    body,
                    metadata: json!({
                        "channel": "social",
                        "platform": platform,
                        "fallback": fallback,
                    }),
                });
            }
        }

        Ok(AgentRunResult {
            assets,
            tokens_in: tokens.0,
            tokens_out: tokens.1,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
