mod linkedin;
mod stubs;
mod twitter;

pub use linkedin::LinkedInPublisher;
pub use stubs::StubPublisher;
pub use twitter::TwitterPublisher;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::core::crypto::CryptoBox;
use crate::core::store::Store;
use crate::core::store::types::AssetKind;

/// Character ceiling for a platform's post body, when the platform has one.
pub fn platform_ceiling(platform: &str) -> Option<usize> {
    match platform {
        "twitter" | "x" => Some(280),
        "linkedin" => Some(3000),
        _ => None,
    }
}

/// Clip a body to a platform ceiling, ending in an ellipsis marker instead
/// of a hard cut. Already-compliant bodies pass through untouched, so the
/// operation is idempotent.
pub fn clip_to_ceiling(body: &str, ceiling: usize) -> String {
    if body.chars().count() <= ceiling {
        return body.to_string();
    }
    let mut clipped: String = body.chars().take(ceiling - 1).collect();
    clipped.push('…');
    clipped
}

/// What the excluded UI layer hands us when a publish is requested.
#[derive(Debug, Clone)]
pub struct PublishContext {
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub kind: AssetKind,
    pub metadata: Value,
}

/// Publish outcomes are data, never exceptions: callers render `error`
/// directly and decide about retries themselves.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub success: bool,
    pub url: Option<String>,
    pub error: Option<String>,
    pub platform_data: Option<Value>,
}

impl PublishResult {
    pub fn ok(url: String, platform_data: Option<Value>) -> Self {
        Self {
            success: true,
            url: Some(url),
            error: None,
            platform_data,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            error: Some(error.into()),
            platform_data: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> &'static str;
    async fn publish(&self, ctx: &PublishContext) -> PublishResult;
}

/// Typed platform -> publisher map, built once at startup and injected.
/// Aliases resolve to a canonical key, so `platforms()` never lists a
/// platform twice.
#[derive(Default)]
pub struct PublisherRegistry {
    publishers: HashMap<String, Arc<dyn Publisher>>,
    aliases: HashMap<String, String>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, publisher: Arc<dyn Publisher>) {
        info!("Registered publisher: {}", publisher.platform());
        self.publishers
            .insert(publisher.platform().to_string(), publisher);
    }

    /// Accept `alias` as another name for an already-registered platform.
    pub fn register_alias(&mut self, alias: &str, platform: &str) {
        if self.publishers.contains_key(platform) {
            self.aliases.insert(alias.to_string(), platform.to_string());
        }
    }

    fn resolve<'a>(&'a self, platform: &'a str) -> &'a str {
        self.aliases
            .get(platform)
            .map(String::as_str)
            .unwrap_or(platform)
    }

    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.publishers.keys().cloned().collect();
        platforms.sort();
        platforms
    }

    pub fn supports(&self, platform: &str) -> bool {
        self.publishers.contains_key(self.resolve(platform))
    }

    /// The one publish call surface. Unknown keys are a typed error; every
    /// other failure comes back inside the `PublishResult`.
    pub async fn publish(
        &self,
        platform: &str,
        ctx: &PublishContext,
    ) -> Result<PublishResult, PublishError> {
        let publisher = self
            .publishers
            .get(self.resolve(platform))
            .ok_or_else(|| PublishError::UnsupportedPlatform(platform.to_string()))?;
        Ok(publisher.publish(ctx).await)
    }

    /// The standard platform set: real linkedin/twitter publishers plus
    /// contract-satisfying stubs for the rest.
    pub fn with_default_publishers(
        store: Arc<Store>,
        crypto: Arc<CryptoBox>,
        client: reqwest::Client,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LinkedInPublisher::new(
            store.clone(),
            crypto.clone(),
            client.clone(),
        )));
        registry.register(Arc::new(TwitterPublisher::new(store, crypto, client)));
        registry.register(Arc::new(StubPublisher::new("facebook")));
        registry.register(Arc::new(StubPublisher::new("instagram")));
        registry.register_alias("x", "twitter");
        registry
    }
}

/// Credential lookup shared by the concrete publishers. Absence and expiry
/// are publish failures, not errors, and no outbound call happens for them.
pub(crate) enum CredentialGate {
    Ready { token: String, metadata: Value },
    Rejected(PublishResult),
}

pub(crate) async fn check_credential(
    store: &Store,
    crypto: &CryptoBox,
    platform: &str,
    user_id: &str,
) -> CredentialGate {
    let credential = match store.get_credential(platform, user_id).await {
        Ok(Some(credential)) => credential,
        Ok(None) => {
            return CredentialGate::Rejected(PublishResult::failure(format!(
                "{} is not connected for this account",
                platform
            )));
        }
        Err(e) => {
            return CredentialGate::Rejected(PublishResult::failure(format!(
                "credential lookup failed: {}",
                e
            )));
        }
    };

    if let Some(expires_at) = credential.expires_at
        && expires_at <= Utc::now()
    {
        return CredentialGate::Rejected(PublishResult::failure(format!(
            "{} credential has expired; reconnect the account",
            platform
        )));
    }

    match crypto.decrypt(&credential.encrypted_token) {
        Ok(token) => CredentialGate::Ready {
            token,
            metadata: credential.metadata,
        },
        Err(e) => CredentialGate::Rejected(PublishResult::failure(format!(
            "stored {} credential could not be decrypted: {}",
            platform, e
        ))),
    }
}

/// Publish one stored asset, recording the attempt as a PublishJob. Terminal
/// jobs are never reopened; a retry is a fresh call to this function.
pub async fn publish_asset(
    store: &Store,
    registry: &PublisherRegistry,
    asset_id: &str,
    platform: &str,
    user_id: &str,
    scheduled_at: Option<&str>,
) -> Result<PublishResult> {
    let asset = store
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("asset {} not found", asset_id))?;

    let job = store
        .create_publish_job(asset_id, platform, scheduled_at)
        .await?;

    if !registry.supports(platform) {
        let message = format!("unsupported platform: {}", platform);
        store.complete_job_failed(&job.id, &message).await?;
        return Ok(PublishResult::failure(message));
    }

    store.mark_job_posting(&job.id).await?;

    let ctx = PublishContext {
        user_id: user_id.to_string(),
        title: asset.title,
        body: asset.body,
        kind: asset.kind,
        metadata: asset.metadata,
    };

    // supports() was checked above, so the registry lookup cannot miss here.
    let result = registry
        .publish(platform, &ctx)
        .await
        .unwrap_or_else(|e| PublishResult::failure(e.to_string()));

    if result.success {
        let url = result.url.clone().unwrap_or_default();
        store.complete_job_success(&job.id, &url).await?;
    } else {
        let error = result
            .error
            .clone()
            .unwrap_or_else(|| "unknown publish failure".to_string());
        store.complete_job_failed(&job.id, &error).await?;
    }

    store
        .record_audit(
            asset.campaign_id.as_deref(),
            "publish_attempt",
            &json!({
                "job_id": job.id,
                "asset_id": asset_id,
                "platform": platform,
                "success": result.success,
            }),
        )
        .await?;

    Ok(result)
}
