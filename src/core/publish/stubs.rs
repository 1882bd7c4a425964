use async_trait::async_trait;

use super::{PublishContext, PublishResult, Publisher};

/// Placeholder for platforms on the roadmap but not yet wired up. Satisfies
/// the publisher contract with a deterministic failure so callers and tests
/// can exercise the full path.
pub struct StubPublisher {
    platform: &'static str,
}

impl StubPublisher {
    pub fn new(platform: &'static str) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    fn platform(&self) -> &'static str {
        self.platform
    }

    async fn publish(&self, _ctx: &PublishContext) -> PublishResult {
        PublishResult::failure(format!(
            "{} publishing is coming soon and is not yet available",
            self.platform
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::types::AssetKind;
    use serde_json::Value;

    #[tokio::test]
    async fn stub_always_fails_with_the_same_message() {
        let stub = StubPublisher::new("facebook");
        let ctx = PublishContext {
            user_id: "user-1".to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            kind: AssetKind::Social,
            metadata: Value::Null,
        };

        let first = stub.publish(&ctx).await;
        let second = stub.publish(&ctx).await;
        assert!(!first.success);
        assert_eq!(first.error, second.error);
        assert!(first.error.unwrap().contains("coming soon"));
    }
}
