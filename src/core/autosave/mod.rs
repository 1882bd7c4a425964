use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::store::Store;
use crate::core::store::types::{AssetPatch, SavedAsset};

/// Debounced autosave for one asset being edited. Edits accumulate into a
/// pending patch; once the editor has been idle for the configured window
/// the patch is flushed as an in-place save. An explicit snapshot goes
/// through `save_as_new_version`, which is the only path that appends to
/// the lineage.
pub struct AutosaveSession {
    store: Arc<Store>,
    asset_id: String,
    pending: Mutex<Option<AssetPatch>>,
    generation: AtomicU64,
    idle: Duration,
}

fn merge(base: AssetPatch, next: AssetPatch) -> AssetPatch {
    AssetPatch {
        title: next.title.or(base.title),
        body: next.body.or(base.body),
        metadata: next.metadata.or(base.metadata),
    }
}

impl AutosaveSession {
    pub fn new(store: Arc<Store>, asset_id: impl Into<String>, idle: Duration) -> Arc<Self> {
        Arc::new(Self {
            store,
            asset_id: asset_id.into(),
            pending: Mutex::new(None),
            generation: AtomicU64::new(0),
            idle,
        })
    }

    /// Record an edit. The flush timer restarts: a flush only happens once
    /// no further edit arrives for the idle window.
    pub async fn edit(self: &Arc<Self>, patch: AssetPatch) {
        let generation = {
            let mut pending = self.pending.lock().await;
            let base = pending.take().unwrap_or_default();
            *pending = Some(merge(base, patch));
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(session.idle).await;
            if session.generation.load(Ordering::SeqCst) != generation {
                return; // a newer edit restarted the clock
            }
            if let Err(e) = session.flush().await {
                warn!(asset_id = %session.asset_id, "Autosave flush failed: {}", e);
            }
        });
    }

    /// Write the pending patch in place, if there is one.
    pub async fn flush(&self) -> Result<Option<SavedAsset>> {
        let patch = {
            let mut pending = self.pending.lock().await;
            pending.take()
        };
        let Some(patch) = patch else {
            return Ok(None);
        };

        let saved = self.store.save_asset(&self.asset_id, patch, false).await?;
        debug!(asset_id = %self.asset_id, version = saved.version, "Autosaved");
        Ok(Some(saved))
    }

    /// Explicit snapshot: fold in any pending edits and append a new version
    /// to the lineage.
    pub async fn save_as_new_version(&self) -> Result<SavedAsset> {
        let patch = {
            let mut pending = self.pending.lock().await;
            pending.take().unwrap_or_default()
        };
        self.store.save_asset(&self.asset_id, patch, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::types::AssetKind;
    use serde_json::Value;

    async fn seed(store: &Store) -> String {
        store
            .insert_asset(None, AssetKind::Blog, "Draft", "original body", Value::Null)
            .await
            .unwrap()
            .id
    }

    fn body_patch(body: &str) -> AssetPatch {
        AssetPatch {
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn idle_editor_gets_flushed_in_place() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let asset_id = seed(&store).await;
        let session = AutosaveSession::new(store.clone(), &asset_id, Duration::from_millis(30));

        session.edit(body_patch("first keystrokes")).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let asset = store.get_asset(&asset_id).await.unwrap().unwrap();
        assert_eq!(asset.body, "first keystrokes");
        assert_eq!(asset.version, 1);
    }

    #[tokio::test]
    async fn rapid_edits_coalesce_into_the_last_state() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let asset_id = seed(&store).await;
        let session = AutosaveSession::new(store.clone(), &asset_id, Duration::from_millis(40));

        session.edit(body_patch("one")).await;
        session.edit(body_patch("two")).await;
        session
            .edit(AssetPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            })
            .await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        let asset = store.get_asset(&asset_id).await.unwrap().unwrap();
        assert_eq!(asset.body, "two");
        assert_eq!(asset.title, "Renamed");
        assert_eq!(asset.version, 1);
        assert_eq!(
            store.list_lineage(&asset.lineage_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn continued_typing_defers_the_flush() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let asset_id = seed(&store).await;
        let session = AutosaveSession::new(store.clone(), &asset_id, Duration::from_millis(60));

        session.edit(body_patch("draft a")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        // Still inside the idle window, so nothing has been written yet.
        let asset = store.get_asset(&asset_id).await.unwrap().unwrap();
        assert_eq!(asset.body, "original body");

        session.edit(body_patch("draft b")).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        let asset = store.get_asset(&asset_id).await.unwrap().unwrap();
        assert_eq!(asset.body, "draft b");
    }

    #[tokio::test]
    async fn explicit_flush_writes_immediately() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let asset_id = seed(&store).await;
        let session = AutosaveSession::new(store.clone(), &asset_id, Duration::from_secs(60));

        session.edit(body_patch("saved by hand")).await;
        let saved = session.flush().await.unwrap().unwrap();
        assert_eq!(saved.version, 1);

        let asset = store.get_asset(&asset_id).await.unwrap().unwrap();
        assert_eq!(asset.body, "saved by hand");
    }

    #[tokio::test]
    async fn flush_without_pending_edits_is_a_no_op() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let asset_id = seed(&store).await;
        let session = AutosaveSession::new(store, &asset_id, Duration::from_secs(60));
        assert!(session.flush().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_appends_a_version_with_pending_edits_folded_in() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let asset_id = seed(&store).await;
        let session = AutosaveSession::new(store.clone(), &asset_id, Duration::from_secs(60));

        session.edit(body_patch("big milestone")).await;
        let saved = session.save_as_new_version().await.unwrap();
        assert_eq!(saved.version, 2);

        let original = store.get_asset(&asset_id).await.unwrap().unwrap();
        assert_eq!(original.body, "original body");
        let snapshot = store.get_asset(&saved.id).await.unwrap().unwrap();
        assert_eq!(snapshot.body, "big milestone");

        // Pending was consumed by the snapshot; nothing left to flush.
        assert!(session.flush().await.unwrap().is_none());
    }
}
