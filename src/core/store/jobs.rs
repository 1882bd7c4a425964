use anyhow::{Result, anyhow};
use rusqlite::{Row, params};
use uuid::Uuid;

use super::types::{JobStatus, PublishJobRecord};
use super::{Store, now_rfc3339};

fn row_to_job(row: &Row) -> rusqlite::Result<PublishJobRecord> {
    let status: String = row.get(3)?;
    Ok(PublishJobRecord {
        id: row.get(0)?,
        asset_id: row.get(1)?,
        platform: row.get(2)?,
        status: JobStatus::from_status(&status).unwrap_or(JobStatus::Queued),
        scheduled_at: row.get(4)?,
        posted_at: row.get(5)?,
        url: row.get(6)?,
        error: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const JOB_COLUMNS: &str =
    "id, asset_id, platform, status, scheduled_at, posted_at, url, error, created_at";

impl Store {
    pub async fn create_publish_job(
        &self,
        asset_id: &str,
        platform: &str,
        scheduled_at: Option<&str>,
    ) -> Result<PublishJobRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO publish_jobs (id, asset_id, platform, status, scheduled_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                asset_id,
                platform,
                JobStatus::Queued.as_str(),
                scheduled_at,
                now
            ],
        )?;

        Ok(PublishJobRecord {
            id,
            asset_id: asset_id.to_string(),
            platform: platform.to_string(),
            status: JobStatus::Queued,
            scheduled_at: scheduled_at.map(String::from),
            posted_at: None,
            url: None,
            error: None,
            created_at: now,
        })
    }

    pub async fn mark_job_posting(&self, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE publish_jobs SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![
                JobStatus::Posting.as_str(),
                id,
                JobStatus::Queued.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("job {} is not queued", id));
        }
        Ok(())
    }

    /// Terminal: success with the public URL. Terminal jobs never mutate
    /// again; a retry is always a fresh job.
    pub async fn complete_job_success(&self, id: &str, url: &str) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE publish_jobs SET status = ?1, url = ?2, posted_at = ?3
             WHERE id = ?4 AND status = ?5",
            params![
                JobStatus::Success.as_str(),
                url,
                now_rfc3339(),
                id,
                JobStatus::Posting.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("job {} is not posting", id));
        }
        Ok(())
    }

    /// Terminal: failed with the normalized error message.
    pub async fn complete_job_failed(&self, id: &str, error: &str) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE publish_jobs SET status = ?1, error = ?2
             WHERE id = ?3 AND status IN (?4, ?5)",
            params![
                JobStatus::Failed.as_str(),
                error,
                id,
                JobStatus::Queued.as_str(),
                JobStatus::Posting.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("job {} is already terminal", id));
        }
        Ok(())
    }

    pub async fn get_publish_job(&self, id: &str) -> Result<Option<PublishJobRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM publish_jobs WHERE id = ?1",
            JOB_COLUMNS
        ))?;
        let mut rows = stmt.query_map([id], row_to_job)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub async fn list_jobs_for_asset(&self, asset_id: &str) -> Result<Vec<PublishJobRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM publish_jobs WHERE asset_id = ?1 ORDER BY created_at",
            JOB_COLUMNS
        ))?;
        let rows = stmt.query_map([asset_id], row_to_job)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
