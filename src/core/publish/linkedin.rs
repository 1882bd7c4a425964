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

const LINKEDIN_CEILING: usize = 3000;

#[derive(Deserialize)]
struct UgcPostResponse {
    id: String,
}

/// Posts to the authenticated member's LinkedIn feed via the UGC posts API.
pub struct LinkedInPublisher {
    store: Arc<Store>,
    crypto: Arc<CryptoBox>,
    client: reqwest::Client,
    base_url: String,
}

impl LinkedInPublisher {
    pub fn new(store: Arc<Store>, crypto: Arc<CryptoBox>, client: reqwest::Client) -> Self {
        Self {
            store,
            crypto,
            client,
            base_url: "https://api.linkedin.com".to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    fn platform(&self) -> &'static str {
        "linkedin"
    }

    async fn publish(&self, ctx: &PublishContext) -> PublishResult {
        let (token, metadata) =
            match check_credential(&self.store, &self.crypto, self.platform(), &ctx.user_id).await
            {
                CredentialGate::Ready { token, metadata } => (token, metadata),
                CredentialGate::Rejected(result) => return result,
            };

        let author = match metadata["account_id"].as_str() {
            Some(urn) => urn.to_string(),
            None => {
                return PublishResult::failure(
                    "linkedin credential is missing the account id; reconnect the account",
                );
            }
        };

        let commentary = clip_to_ceiling(&ctx.body, LINKEDIN_CEILING);
        let payload = json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": {"text": commentary},
                    "shareMediaCategory": "NONE",
                },
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC",
            },
        });

        debug!("Posting to LinkedIn as {}", author);
        let response = match self
            .client
            .post(format!("{}/v2/ugcPosts", self.base_url))
            .header("Authorization", format!("Bearer {}", token))
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return PublishResult::failure(format!("linkedin request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return PublishResult::failure(format!(
                "linkedin API error (HTTP {}): {}",
                status.as_u16(),
                body
            ));
        }

        match response.json::<UgcPostResponse>().await {
            Ok(post) => PublishResult::ok(
                format!("https://www.linkedin.com/feed/update/{}", post.id),
                Some(json!({"post_id": post.id})),
            ),
            Err(e) => PublishResult::failure(format!("linkedin response was malformed: {}", e)),
        }
    }
}
