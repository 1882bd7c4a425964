use anyhow::{Result, anyhow};
use rusqlite::{Row, params};
use uuid::Uuid;

use super::types::{CampaignRecord, CampaignStatus, NewCampaign};
use super::{Store, now_rfc3339};

fn row_to_campaign(row: &Row) -> rusqlite::Result<CampaignRecord> {
    let channels_json: String = row.get(5)?;
    let status: String = row.get(7)?;
    Ok(CampaignRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        objective: row.get(2)?,
        audience: row.get(3)?,
        brand_voice: row.get(4)?,
        channels: serde_json::from_str(&channels_json).unwrap_or_default(),
        target_length: row.get(6)?,
        status: CampaignStatus::from_status(&status).unwrap_or(CampaignStatus::Draft),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const CAMPAIGN_COLUMNS: &str = "id, title, objective, audience, brand_voice, channels, \
     target_length, status, created_at, updated_at";

impl Store {
    pub async fn create_campaign(&self, new: NewCampaign) -> Result<CampaignRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let channels_json = serde_json::to_string(&new.channels)?;

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO campaigns (id, title, objective, audience, brand_voice, channels,
                 target_length, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                new.title,
                new.objective,
                new.audience,
                new.brand_voice,
                channels_json,
                new.target_length,
                CampaignStatus::Draft.as_str(),
                now,
                now
            ],
        )?;

        Ok(CampaignRecord {
            id,
            title: new.title,
            objective: new.objective,
            audience: new.audience,
            brand_voice: new.brand_voice,
            channels: new.channels,
            target_length: new.target_length,
            status: CampaignStatus::Draft,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Option<CampaignRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM campaigns WHERE id = ?1",
            CAMPAIGN_COLUMNS
        ))?;
        let mut rows = stmt.query_map([id], row_to_campaign)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub async fn list_campaigns(&self) -> Result<Vec<CampaignRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM campaigns ORDER BY created_at DESC",
            CAMPAIGN_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_campaign)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub async fn set_campaign_status(&self, id: &str, status: CampaignStatus) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE campaigns SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(anyhow!("campaign {} not found", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewCampaign {
        NewCampaign {
            title: "Launch".to_string(),
            objective: "Announce the new product".to_string(),
            audience: "B2B founders".to_string(),
            brand_voice: "confident".to_string(),
            channels: vec!["blog".to_string(), "social".to_string()],
            target_length: Some(800),
        }
    }

    #[tokio::test]
    async fn create_and_fetch_campaign() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_campaign(sample()).await.unwrap();
        assert_eq!(created.status, CampaignStatus::Draft);

        let fetched = store.get_campaign(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Launch");
        assert_eq!(fetched.channels, vec!["blog", "social"]);
        assert_eq!(fetched.target_length, Some(800));
    }

    #[tokio::test]
    async fn unknown_campaign_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_campaign("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_transitions_are_persisted() {
        let store = Store::open_in_memory().unwrap();
        let campaign = store.create_campaign(sample()).await.unwrap();

        store
            .set_campaign_status(&campaign.id, CampaignStatus::Running)
            .await
            .unwrap();
        store
            .set_campaign_status(&campaign.id, CampaignStatus::Completed)
            .await
            .unwrap();

        let fetched = store.get_campaign(&campaign.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CampaignStatus::Completed);
    }

    #[tokio::test]
    async fn status_update_for_missing_campaign_fails() {
        let store = Store::open_in_memory().unwrap();
        assert!(
            store
                .set_campaign_status("ghost", CampaignStatus::Running)
                .await
                .is_err()
        );
    }
}
