use anyhow::Result;
use rusqlite::{Row, params};
use serde_json::Value;

use super::types::AuditEventRecord;
use super::{Store, now_rfc3339};

fn row_to_event(row: &Row) -> rusqlite::Result<AuditEventRecord> {
    let detail_json: String = row.get(3)?;
    Ok(AuditEventRecord {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        kind: row.get(2)?,
        detail: serde_json::from_str(&detail_json).unwrap_or(Value::Null),
        created_at: row.get(4)?,
    })
}

impl Store {
    /// Append one audit row. The trail is append-only; there is no update or
    /// delete path.
    pub async fn record_audit(
        &self,
        campaign_id: Option<&str>,
        kind: &str,
        detail: &Value,
    ) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO audit_events (campaign_id, kind, detail, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                campaign_id,
                kind,
                serde_json::to_string(detail)?,
                now_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub async fn list_audit_for_campaign(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<AuditEventRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, campaign_id, kind, detail, created_at
             FROM audit_events WHERE campaign_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([campaign_id], row_to_event)?;

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
    use serde_json::json;

    #[tokio::test]
    async fn events_append_in_order() {
        let store = Store::open_in_memory().unwrap();
        store
            .record_audit(Some("c1"), "run_started", &json!({"agents": 2}))
            .await
            .unwrap();
        store
            .record_audit(Some("c1"), "agent_done", &json!({"agent": "copy"}))
            .await
            .unwrap();
        store
            .record_audit(None, "publish_attempt", &json!({"platform": "twitter"}))
            .await
            .unwrap();

        let events = store.list_audit_for_campaign("c1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "run_started");
        assert_eq!(events[1].detail["agent"], "copy");
    }
}
