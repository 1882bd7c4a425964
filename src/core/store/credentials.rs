use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use serde_json::Value;

use super::types::CredentialRecord;
use super::{Store, now_rfc3339};

fn row_to_credential(row: &Row) -> rusqlite::Result<CredentialRecord> {
    let expires_at: Option<String> = row.get(3)?;
    let metadata_json: String = row.get(4)?;
    Ok(CredentialRecord {
        platform: row.get(0)?,
        user_id: row.get(1)?,
        encrypted_token: row.get(2)?,
        expires_at: expires_at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        metadata: serde_json::from_str(&metadata_json).unwrap_or(Value::Null),
        created_at: row.get(5)?,
    })
}

impl Store {
    /// Store (or replace) the encrypted token for one platform connection.
    /// The token value is already ciphertext; the store treats it as opaque.
    pub async fn upsert_credential(
        &self,
        platform: &str,
        user_id: &str,
        encrypted_token: &str,
        expires_at: Option<DateTime<Utc>>,
        metadata: Value,
    ) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO oauth_credentials (platform, user_id, encrypted_token, expires_at,
                 metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(platform, user_id) DO UPDATE SET
                 encrypted_token = excluded.encrypted_token,
                 expires_at = excluded.expires_at,
                 metadata = excluded.metadata",
            params![
                platform,
                user_id,
                encrypted_token,
                expires_at.map(|dt| dt.to_rfc3339()),
                serde_json::to_string(&metadata)?,
                now_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub async fn get_credential(
        &self,
        platform: &str,
        user_id: &str,
    ) -> Result<Option<CredentialRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT platform, user_id, encrypted_token, expires_at, metadata, created_at
             FROM oauth_credentials WHERE platform = ?1 AND user_id = ?2",
        )?;
        let mut rows = stmt.query_map([platform, user_id], row_to_credential)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Disconnect a platform. Returns whether a credential existed.
    pub async fn delete_credential(&self, platform: &str, user_id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let deleted = db.execute(
            "DELETE FROM oauth_credentials WHERE platform = ?1 AND user_id = ?2",
            [platform, user_id],
        )?;
        Ok(deleted > 0)
    }

    pub async fn list_connected_platforms(&self, user_id: &str) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT platform FROM oauth_credentials WHERE user_id = ?1 ORDER BY platform",
        )?;
        let rows = stmt.query_map([user_id], |row| row.get(0))?;

        let mut platforms = Vec::new();
        for platform in rows {
            platforms.push(platform?);
        }
        Ok(platforms)
    }
}
