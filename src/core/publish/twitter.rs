use serde_derive::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{
    CredentialGate, PublishContext, PublishResult, Publisher, check_credential, clip_to_ceiling,
};
use crate::core::crypto::CryptoBox;
use crate::core::store::Store;
use async_trait::async_trait;

const TWEET_CEILING: usize = 280;

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

/// Posts a tweet through the v2 API.
pub struct TwitterPublisher {
    store: Arc<Store>,
    crypto: Arc<CryptoBox>,
    client: reqwest::Client,
    base_url: String,
}

impl TwitterPublisher {
    pub fn new(store: Arc<Store>, crypto: Arc<CryptoBox>, client: reqwest::Client) -> Self {
        Self {
            store,
            crypto,
            client,
            base_url: "https://api.x.com".to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> &'static str {
        "twitter"
    }

    async fn publish(&self, ctx: &PublishContext) -> PublishResult {
        let token =
            match check_credential(&self.store, &self.crypto, self.platform(), &ctx.user_id).await
            {
                CredentialGate::Ready { token, .. } => token,
                CredentialGate::Rejected(result) => return result,
            };

        // The ceiling is also enforced at generation time; clipping here
        // covers bodies that arrive through other paths.
        let text = clip_to_ceiling(&ctx.body, TWEET_CEILING);

        debug!("Posting tweet ({} chars)", text.chars().count());
        let response = match self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({"text": text}))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return PublishResult::failure(format!("twitter request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return PublishResult::failure(format!(
                "twitter API error (HTTP {}): {}",
                status.as_u16(),
                body
            ));
        }

        match response.json::<TweetResponse>().await {
            Ok(tweet) => PublishResult::ok(
                format!("https://x.com/i/web/status/{}", tweet.data.id),
                Some(json!({"tweet_id": tweet.data.id})),
            ),
            Err(e) => PublishResult::failure(format!("twitter response was malformed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use crate::core::store::types::AssetKind;

    fn ctx() -> PublishContext {
        PublishContext {
            user_id: "user-1".to_string(),
            title: "Launch".to_string(),
            body: "Short tweet".to_string(),
            kind: AssetKind::Social,
            metadata: Value::Null,
        }
    }

    #[tokio::test]
    async fn missing_credential_fails_without_a_network_call() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let crypto = Arc::new(CryptoBox::new("secret").unwrap());
        let publisher = TwitterPublisher::new(store, crypto, reqwest::Client::new())
            .with_base_url("http://127.0.0.1:1");

        let result = publisher.publish(&ctx()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not connected"));
    }
}
