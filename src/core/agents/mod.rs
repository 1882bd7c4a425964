mod copy;
mod personalize;
mod strategy;
mod video;
mod visual;

pub use copy::CopyAgent;
pub use personalize::PersonalizeAgent;
pub use strategy::StrategyAgent;
pub use video::VideoAgent;
pub use visual::VisualAgent;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::llm::{ChatMessage, Generation, TextProvider};
use crate::core::store::types::{AssetKind, CampaignRecord};

/// The default chain order for a full campaign run.
pub const DEFAULT_AGENT_ORDER: [&str; 5] = ["strategy", "copy", "visual", "video", "personalize"];

/// Immutable view of the campaign brief handed to every agent.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentContext {
    pub title: String,
    pub objective: String,
    pub audience: String,
    pub brand_voice: String,
    pub channels: Vec<String>,
    pub target_length: Option<u32>,
}

impl From<&CampaignRecord> for AgentContext {
    fn from(campaign: &CampaignRecord) -> Self {
        Self {
            title: campaign.title.clone(),
            objective: campaign.objective.clone(),
            audience: campaign.audience.clone(),
            brand_voice: campaign.brand_voice.clone(),
            channels: campaign.channels.clone(),
            target_length: campaign.target_length,
        }
    }
}

impl AgentContext {
    pub fn wants_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

/// An asset as produced by an agent, before persistence assigns identity,
/// version, and derived metadata.
#[derive(Debug, Clone)]
pub struct DraftAsset {
    pub kind: AssetKind,
    pub title: String,
    pub body: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Default)]
pub struct AgentRunResult {
    pub assets: Vec<DraftAsset>,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub elapsed_ms: u64,
}

/// A content-generation unit. Pure from the orchestrator's perspective: its
/// only side effect is the provider call, and it returns fallback content
/// instead of erroring when that call fails.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: &AgentContext) -> Result<AgentRunResult>;
}

/// Typed name -> agent map, built once at startup and injected into the
/// runner. Unknown names surface as a lookup miss, never a panic.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        info!("Registered agent: {}", agent.name());
        self.agents.insert(agent.name().to_string(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    /// The standard five-agent set wired to one provider.
    pub fn with_default_agents(provider: Arc<dyn TextProvider>, call_timeout: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(StrategyAgent::new(provider.clone(), call_timeout)));
        registry.register(Arc::new(CopyAgent::new(provider.clone(), call_timeout)));
        registry.register(Arc::new(VisualAgent::new(provider.clone(), call_timeout)));
        registry.register(Arc::new(VideoAgent::new(provider.clone(), call_timeout)));
        registry.register(Arc::new(PersonalizeAgent::new(provider, call_timeout)));
        registry
    }
}

/// Call the provider with a deadline. Any failure or timeout yields `None`
/// so the calling agent can fall back to templated content.
pub(crate) async fn generate_or_none(
    provider: &Arc<dyn TextProvider>,
    timeout: Duration,
    agent: &str,
    messages: &[ChatMessage],
) -> Option<Generation> {
    match tokio::time::timeout(timeout, provider.generate(messages)).await {
        Ok(Ok(generation)) => Some(generation),
        Ok(Err(e)) => {
            warn!(agent, "provider call failed, using fallback: {}", e);
            None
        }
        Err(_) => {
            warn!(agent, timeout_ms = timeout.as_millis() as u64, "provider call timed out, using fallback");
            None
        }
    }
}

/// Pull a JSON object out of provider text, tolerating markdown code fences.
pub(crate) fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<Value>(inner) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::MockProvider;

    #[test]
    fn context_reflects_the_campaign_brief() {
        let campaign = CampaignRecord {
            id: "c1".to_string(),
            title: "Launch".to_string(),
            objective: "Announce".to_string(),
            audience: "founders".to_string(),
            brand_voice: "bold".to_string(),
            channels: vec!["blog".to_string()],
            target_length: Some(500),
            status: crate::core::store::types::CampaignStatus::Draft,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let ctx = AgentContext::from(&campaign);
        assert!(ctx.wants_channel("blog"));
        assert!(!ctx.wants_channel("social"));
        assert_eq!(ctx.target_length, Some(500));
    }

    #[test]
    fn registry_holds_the_five_default_agents() {
        let provider: Arc<dyn TextProvider> = Arc::new(MockProvider::replying("ok"));
        let registry = AgentRegistry::with_default_agents(provider, Duration::from_secs(5));
        assert_eq!(
            registry.names(),
            vec!["copy", "personalize", "strategy", "video", "visual"]
        );
        assert!(registry.get("copy").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn json_extraction_handles_fences_and_garbage() {
        assert!(extract_json_object(r#"{"a": 1}"#).is_some());
        assert!(extract_json_object("```json\n{\"a\": 1}\n```").is_some());
        assert!(extract_json_object("```\n{\"a\": 1}\n```").is_some());
        assert!(extract_json_object("not json at all").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }

    #[tokio::test]
    async fn provider_timeout_degrades_to_none() {
        let provider: Arc<dyn TextProvider> = Arc::new(
            MockProvider::replying("slow").with_delay(Duration::from_millis(200)),
        );
        let result = generate_or_none(
            &provider,
            Duration::from_millis(20),
            "copy",
            &[ChatMessage::user("hi")],
        )
        .await;
        assert!(result.is_none());
    }
}
