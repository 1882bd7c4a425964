use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::agents::AgentRegistry;
use crate::core::config::Config;
use crate::core::crypto::CryptoBox;
use crate::core::llm::{MockProvider, OpenAiProvider, TextProvider};
use crate::core::publish::PublisherRegistry;
use crate::core::runner::AgentRunner;
use crate::core::scheduler::ContentScheduler;
use crate::core::store::Store;

/// Everything a command needs, wired once at startup.
pub struct App {
    pub config: Config,
    pub store: Arc<Store>,
    pub crypto: Arc<CryptoBox>,
    pub runner: Arc<AgentRunner>,
    pub publishers: Arc<PublisherRegistry>,
    pub scheduler: Arc<ContentScheduler>,
}

impl App {
    pub fn init(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("could not create data directory {}", config.data_dir.display())
        })?;
        let store = Arc::new(Store::open(config.data_dir.join("herald.db"))?);
        let crypto = Arc::new(CryptoBox::new(&config.master_secret)?);

        let provider: Arc<dyn TextProvider> = match &config.provider_api_key {
            Some(api_key) => {
                info!(model = %config.provider_model, "Using remote text provider");
                Arc::new(OpenAiProvider::new(
                    config.provider_base_url.clone(),
                    config.provider_model.clone(),
                    api_key.clone(),
                ))
            }
            None => {
                warn!("HERALD_PROVIDER_API_KEY is not set; agents will serve canned content");
                Arc::new(MockProvider::replying(
                    "Placeholder content. Configure a provider API key for real generation.",
                ))
            }
        };

        let agent_timeout = Duration::from_secs(config.agent_timeout_secs);
        let registry = Arc::new(AgentRegistry::with_default_agents(provider, agent_timeout));
        let runner = Arc::new(AgentRunner::new(store.clone(), registry, agent_timeout));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.publish_timeout_secs))
            .build()?;
        let publishers = Arc::new(PublisherRegistry::with_default_publishers(
            store.clone(),
            crypto.clone(),
            client,
        ));

        let scheduler = Arc::new(ContentScheduler::new(
            store.clone(),
            runner.clone(),
            publishers.clone(),
        ));

        Ok(Self {
            config,
            store,
            crypto,
            runner,
            publishers,
            scheduler,
        })
    }
}
