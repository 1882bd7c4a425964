use anyhow::{Result, anyhow};
use std::path::PathBuf;

/// Process-wide configuration, resolved once at startup. Anything missing
/// here fails initialization rather than failing per request later.
#[derive(Debug, Clone)]
pub struct Config {
    /// Master secret for credential encryption. Required.
    pub master_secret: String,
    /// OpenAI-compatible chat completions endpoint.
    pub provider_base_url: String,
    pub provider_model: String,
    pub provider_api_key: Option<String>,
    /// Directory holding the sqlite database.
    pub data_dir: PathBuf,
    /// Upper bound on a single agent invocation, including the provider call.
    pub agent_timeout_secs: u64,
    /// Upper bound on a single outbound publish call.
    pub publish_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup so tests can inject
    /// values without touching process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let master_secret = get("HERALD_MASTER_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow!("HERALD_MASTER_SECRET is not set; credential encryption cannot start")
            })?;

        let provider_base_url = get("HERALD_PROVIDER_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());
        let provider_model =
            get("HERALD_PROVIDER_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let provider_api_key = get("HERALD_PROVIDER_API_KEY").filter(|s| !s.is_empty());

        let data_dir = get("HERALD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("herald_data"));

        let agent_timeout_secs = parse_secs(get("HERALD_AGENT_TIMEOUT_SECS"), 60);
        let publish_timeout_secs = parse_secs(get("HERALD_PUBLISH_TIMEOUT_SECS"), 30);

        Ok(Self {
            master_secret,
            provider_base_url,
            provider_model,
            provider_api_key,
            data_dir,
            agent_timeout_secs,
            publish_timeout_secs,
        })
    }
}

fn parse_secs(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
