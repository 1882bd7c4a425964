use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};
use serde_json::{Value, json};
use uuid::Uuid;

use super::types::{AssetKind, AssetPatch, ContentAssetRecord, SavedAsset};
use super::{Store, now_rfc3339};

/// Word/char/reading-time metadata derived from the body at persistence
/// time. Callers never supply these; they are recomputed on every save.
pub fn derive_metadata(body: &str) -> Value {
    let words = body.split_whitespace().count();
    let chars = body.chars().count();
    json!({
        "word_count": words,
        "char_count": chars,
        "reading_time_min": words.div_ceil(200),
    })
}

fn with_derived(metadata: Value, body: &str) -> Value {
    let mut map = match metadata {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    if let Value::Object(derived) = derive_metadata(body) {
        for (key, value) in derived {
            map.insert(key, value);
        }
    }
    Value::Object(map)
}

fn row_to_asset(row: &Row) -> rusqlite::Result<ContentAssetRecord> {
    let kind: String = row.get(4)?;
    let metadata_json: String = row.get(7)?;
    Ok(ContentAssetRecord {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        lineage_id: row.get(2)?,
        version: row.get(3)?,
        kind: AssetKind::from_kind(&kind).unwrap_or(AssetKind::Blog),
        title: row.get(5)?,
        body: row.get(6)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or(Value::Null),
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const ASSET_COLUMNS: &str = "id, campaign_id, lineage_id, version, kind, title, body, metadata, \
     status, created_at, updated_at";

fn fetch_asset(db: &Connection, id: &str) -> Result<Option<ContentAssetRecord>> {
    let mut stmt = db.prepare(&format!(
        "SELECT {} FROM content_assets WHERE id = ?1",
        ASSET_COLUMNS
    ))?;
    let mut rows = stmt.query_map([id], row_to_asset)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

impl Store {
    /// Persist a freshly generated asset as version 1 of a new lineage.
    pub async fn insert_asset(
        &self,
        campaign_id: Option<&str>,
        kind: AssetKind,
        title: &str,
        body: &str,
        metadata: Value,
    ) -> Result<ContentAssetRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let metadata = with_derived(metadata, body);

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO content_assets (id, campaign_id, lineage_id, version, kind, title,
                 body, metadata, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7, 'draft', ?8, ?9)",
            params![
                id,
                campaign_id,
                id, // the first row's id doubles as the lineage key
                kind.as_str(),
                title,
                body,
                serde_json::to_string(&metadata)?,
                now,
                now
            ],
        )?;

        Ok(ContentAssetRecord {
            id: id.clone(),
            campaign_id: campaign_id.map(String::from),
            lineage_id: id,
            version: 1,
            kind,
            title: title.to_string(),
            body: body.to_string(),
            metadata,
            status: "draft".to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Apply an edit. `as_new_version=false` mutates the row in place;
    /// `true` appends a snapshot row with version = max(lineage) + 1,
    /// carrying unspecified fields forward. Derived metadata is recomputed
    /// from the effective body either way.
    pub async fn save_asset(
        &self,
        asset_id: &str,
        patch: AssetPatch,
        as_new_version: bool,
    ) -> Result<SavedAsset> {
        let db = self.db.lock().await;
        let existing =
            fetch_asset(&db, asset_id)?.ok_or_else(|| anyhow!("asset {} not found", asset_id))?;

        let title = patch.title.unwrap_or(existing.title);
        let body = patch.body.unwrap_or(existing.body);
        let metadata = with_derived(patch.metadata.unwrap_or(existing.metadata), &body);
        let metadata_json = serde_json::to_string(&metadata)?;
        let now = now_rfc3339();

        if !as_new_version {
            db.execute(
                "UPDATE content_assets SET title = ?1, body = ?2, metadata = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![title, body, metadata_json, now, asset_id],
            )?;
            return Ok(SavedAsset {
                id: asset_id.to_string(),
                version: existing.version,
            });
        }

        let max_version: i64 = db.query_row(
            "SELECT MAX(version) FROM content_assets WHERE lineage_id = ?1",
            [&existing.lineage_id],
            |row| row.get(0),
        )?;
        let version = max_version + 1;
        let id = Uuid::new_v4().to_string();

        db.execute(
            "INSERT INTO content_assets (id, campaign_id, lineage_id, version, kind, title,
                 body, metadata, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                existing.campaign_id,
                existing.lineage_id,
                version,
                existing.kind.as_str(),
                title,
                body,
                metadata_json,
                existing.status,
                now,
                now
            ],
        )?;

        Ok(SavedAsset { id, version })
    }

    pub async fn get_asset(&self, id: &str) -> Result<Option<ContentAssetRecord>> {
        let db = self.db.lock().await;
        fetch_asset(&db, id)
    }

    pub async fn list_assets_for_campaign(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<ContentAssetRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM content_assets WHERE campaign_id = ?1 ORDER BY created_at",
            ASSET_COLUMNS
        ))?;
        let rows = stmt.query_map([campaign_id], row_to_asset)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// All versions of one lineage, oldest first.
    pub async fn list_lineage(&self, lineage_id: &str) -> Result<Vec<ContentAssetRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM content_assets WHERE lineage_id = ?1 ORDER BY version",
            ASSET_COLUMNS
        ))?;
        let rows = stmt.query_map([lineage_id], row_to_asset)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_asset(store: &Store) -> ContentAssetRecord {
        store
            .insert_asset(
                Some("c1"),
                AssetKind::Blog,
                "First draft",
                "one two three four five",
                json!({"platform": "blog"}),
            )
            .await
            .unwrap()
    }

    #[test]
    fn derived_metadata_counts_words_and_chars() {
        let meta = derive_metadata("hello brave new world");
        assert_eq!(meta["word_count"], 4);
        assert_eq!(meta["char_count"], 21);
        assert_eq!(meta["reading_time_min"], 1);
    }

    #[test]
    fn reading_time_rounds_up() {
        let body = vec!["word"; 201].join(" ");
        assert_eq!(derive_metadata(&body)["reading_time_min"], 2);
        assert_eq!(derive_metadata("")["reading_time_min"], 0);
    }

    #[tokio::test]
    async fn insert_starts_a_lineage_at_version_one() {
        let store = Store::open_in_memory().unwrap();
        let asset = seed_asset(&store).await;
        assert_eq!(asset.version, 1);
        assert_eq!(asset.lineage_id, asset.id);
        assert_eq!(asset.metadata["word_count"], 5);
        assert_eq!(asset.metadata["platform"], "blog");
    }

    #[tokio::test]
    async fn in_place_save_keeps_the_version() {
        let store = Store::open_in_memory().unwrap();
        let asset = seed_asset(&store).await;

        let saved = store
            .save_asset(
                &asset.id,
                AssetPatch {
                    body: Some("short now".to_string()),
                    ..Default::default()
                },
                false,
            )
            .await
            .unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(saved.id, asset.id);

        let fetched = store.get_asset(&asset.id).await.unwrap().unwrap();
        assert_eq!(fetched.body, "short now");
        assert_eq!(fetched.metadata["word_count"], 2);
        // Unpatched fields carry forward.
        assert_eq!(fetched.title, "First draft");
    }

    #[tokio::test]
    async fn new_versions_are_gapless_and_append_only() {
        let store = Store::open_in_memory().unwrap();
        let asset = seed_asset(&store).await;

        let mut latest = asset.id.clone();
        for expected in 2..=5 {
            let saved = store
                .save_asset(
                    &latest,
                    AssetPatch {
                        body: Some(format!("revision {}", expected)),
                        ..Default::default()
                    },
                    true,
                )
                .await
                .unwrap();
            assert_eq!(saved.version, expected);
            latest = saved.id;
        }

        let versions: Vec<i64> = store
            .list_lineage(&asset.lineage_id)
            .await
            .unwrap()
            .iter()
            .map(|a| a.version)
            .collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);

        // The original row is untouched.
        let original = store.get_asset(&asset.id).await.unwrap().unwrap();
        assert_eq!(original.body, "one two three four five");
    }

    #[tokio::test]
    async fn new_version_from_an_old_row_still_extends_the_lineage_tip() {
        let store = Store::open_in_memory().unwrap();
        let asset = seed_asset(&store).await;
        store
            .save_asset(&asset.id, AssetPatch::default(), true)
            .await
            .unwrap();

        // Saving from version 1 again must yield version 3, not a duplicate 2.
        let saved = store
            .save_asset(&asset.id, AssetPatch::default(), true)
            .await
            .unwrap();
        assert_eq!(saved.version, 3);
    }

    #[tokio::test]
    async fn caller_supplied_counts_are_overwritten() {
        let store = Store::open_in_memory().unwrap();
        let asset = store
            .insert_asset(
                None,
                AssetKind::Social,
                "Post",
                "ten chars!",
                json!({"char_count": 9999, "platform": "twitter"}),
            )
            .await
            .unwrap();
        assert_eq!(asset.metadata["char_count"], 10);
        assert_eq!(asset.metadata["platform"], "twitter");
    }

    #[tokio::test]
    async fn save_missing_asset_fails() {
        let store = Store::open_in_memory().unwrap();
        assert!(
            store
                .save_asset("ghost", AssetPatch::default(), false)
                .await
                .is_err()
        );
    }
}
