use anyhow::{Result, anyhow};
use rusqlite::{Row, params};
use uuid::Uuid;

use super::types::{AgentTaskRecord, TaskStatus};
use super::{Store, now_rfc3339};

fn row_to_task(row: &Row) -> rusqlite::Result<AgentTaskRecord> {
    let status: String = row.get(3)?;
    Ok(AgentTaskRecord {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        agent: row.get(2)?,
        status: TaskStatus::from_status(&status).unwrap_or(TaskStatus::Queued),
        input_snapshot: row.get(4)?,
        output_snapshot: row.get(5)?,
        tokens_in: row.get(6)?,
        tokens_out: row.get(7)?,
        latency_ms: row.get(8)?,
        error: row.get(9)?,
        created_at: row.get(10)?,
        started_at: row.get(11)?,
        completed_at: row.get(12)?,
    })
}

const TASK_COLUMNS: &str = "id, campaign_id, agent, status, input_snapshot, output_snapshot, \
     tokens_in, tokens_out, latency_ms, error, created_at, started_at, completed_at";

impl Store {
    /// Create a task row in `queued` state at dispatch time.
    pub async fn create_task(
        &self,
        campaign_id: &str,
        agent: &str,
        input_snapshot: &str,
    ) -> Result<AgentTaskRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO agent_tasks (id, campaign_id, agent, status, input_snapshot, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                campaign_id,
                agent,
                TaskStatus::Queued.as_str(),
                input_snapshot,
                now
            ],
        )?;

        Ok(AgentTaskRecord {
            id,
            campaign_id: campaign_id.to_string(),
            agent: agent.to_string(),
            status: TaskStatus::Queued,
            input_snapshot: input_snapshot.to_string(),
            output_snapshot: None,
            tokens_in: 0,
            tokens_out: 0,
            latency_ms: 0,
            error: None,
            created_at: now,
            started_at: None,
            completed_at: None,
        })
    }

    /// queued -> running. Fails if the task already left `queued`.
    pub async fn mark_task_running(&self, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE agent_tasks SET status = ?1, started_at = ?2
             WHERE id = ?3 AND status = ?4",
            params![
                TaskStatus::Running.as_str(),
                now_rfc3339(),
                id,
                TaskStatus::Queued.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("task {} is not queued", id));
        }
        Ok(())
    }

    /// running -> done, recording telemetry and the output snapshot.
    pub async fn mark_task_done(
        &self,
        id: &str,
        tokens_in: i64,
        tokens_out: i64,
        latency_ms: i64,
        output_snapshot: &str,
    ) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE agent_tasks
             SET status = ?1, tokens_in = ?2, tokens_out = ?3, latency_ms = ?4,
                 output_snapshot = ?5, completed_at = ?6
             WHERE id = ?7 AND status = ?8",
            params![
                TaskStatus::Done.as_str(),
                tokens_in,
                tokens_out,
                latency_ms,
                output_snapshot,
                now_rfc3339(),
                id,
                TaskStatus::Running.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("task {} is not running", id));
        }
        Ok(())
    }

    /// {queued,running} -> error with the captured message.
    pub async fn mark_task_error(&self, id: &str, message: &str, latency_ms: i64) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE agent_tasks
             SET status = ?1, error = ?2, latency_ms = ?3, completed_at = ?4
             WHERE id = ?5 AND status IN (?6, ?7)",
            params![
                TaskStatus::Error.as_str(),
                message,
                latency_ms,
                now_rfc3339(),
                id,
                TaskStatus::Queued.as_str(),
                TaskStatus::Running.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("task {} is already terminal", id));
        }
        Ok(())
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<AgentTaskRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM agent_tasks WHERE id = ?1",
            TASK_COLUMNS
        ))?;
        let mut rows = stmt.query_map([id], row_to_task)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub async fn list_tasks_for_campaign(&self, campaign_id: &str) -> Result<Vec<AgentTaskRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM agent_tasks WHERE campaign_id = ?1 ORDER BY created_at",
            TASK_COLUMNS
        ))?;
        let rows = stmt.query_map([campaign_id], row_to_task)?;

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

    #[tokio::test]
    async fn task_walks_queued_running_done() {
        let store = Store::open_in_memory().unwrap();
        let task = store.create_task("c1", "copy", "{}").await.unwrap();
        assert_eq!(task.status, TaskStatus::Queued);

        store.mark_task_running(&task.id).await.unwrap();
        store
            .mark_task_done(&task.id, 120, 340, 900, r#"{"assets":2}"#)
            .await
            .unwrap();

        let fetched = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TaskStatus::Done);
        assert_eq!(fetched.tokens_in, 120);
        assert_eq!(fetched.tokens_out, 340);
        assert!(fetched.started_at.is_some());
        assert!(fetched.completed_at.is_some());
    }

    #[tokio::test]
    async fn error_is_terminal() {
        let store = Store::open_in_memory().unwrap();
        let task = store.create_task("c1", "video", "{}").await.unwrap();
        store.mark_task_running(&task.id).await.unwrap();
        store
            .mark_task_error(&task.id, "provider timed out", 60_000)
            .await
            .unwrap();

        // No transitions out of a terminal state.
        assert!(store.mark_task_running(&task.id).await.is_err());
        assert!(store.mark_task_done(&task.id, 0, 0, 0, "{}").await.is_err());
        assert!(store.mark_task_error(&task.id, "again", 0).await.is_err());

        let fetched = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TaskStatus::Error);
        assert_eq!(fetched.error.as_deref(), Some("provider timed out"));
    }

    #[tokio::test]
    async fn running_twice_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let task = store.create_task("c1", "copy", "{}").await.unwrap();
        store.mark_task_running(&task.id).await.unwrap();
        assert!(store.mark_task_running(&task.id).await.is_err());
    }

    #[tokio::test]
    async fn tasks_list_in_creation_order() {
        let store = Store::open_in_memory().unwrap();
        for agent in ["strategy", "copy", "video"] {
            store.create_task("c1", agent, "{}").await.unwrap();
        }
        let tasks = store.list_tasks_for_campaign("c1").await.unwrap();
        let agents: Vec<&str> = tasks.iter().map(|t| t.agent.as_str()).collect();
        assert_eq!(agents, vec!["strategy", "copy", "video"]);
    }
}
