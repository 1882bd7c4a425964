use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use uuid::Uuid;

use super::Store;
use super::types::{
    AssetKind, Frequency, NewSchedule, SchedulePatch, ScheduleRecord, ScheduleStatus,
};

fn parse_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_schedule(row: &Row) -> rusqlite::Result<ScheduleRecord> {
    let frequency: String = row.get(3)?;
    let kind: String = row.get(6)?;
    let topics_json: String = row.get(7)?;
    let status: String = row.get(12)?;
    Ok(ScheduleRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        enabled: row.get(2)?,
        frequency: Frequency::from_frequency(&frequency).unwrap_or(Frequency::Weekly),
        day_of_week: row.get(4)?,
        time_of_day: row.get(5)?,
        kind: AssetKind::from_kind(&kind).unwrap_or(AssetKind::Blog),
        topics: serde_json::from_str(&topics_json).unwrap_or_default(),
        auto_publish: row.get(8)?,
        user_id: row.get(9)?,
        last_run: parse_ts(row.get(10)?),
        next_run: parse_ts(row.get(11)?),
        status: ScheduleStatus::from_status(&status).unwrap_or(ScheduleStatus::Active),
    })
}

const SCHEDULE_COLUMNS: &str = "id, name, enabled, frequency, day_of_week, time_of_day, kind, \
     topics, auto_publish, user_id, last_run, next_run, status";

impl Store {
    pub async fn create_schedule(
        &self,
        new: NewSchedule,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<ScheduleRecord> {
        let id = Uuid::new_v4().to_string();

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO schedules (id, name, enabled, frequency, day_of_week, time_of_day,
                 kind, topics, auto_publish, user_id, next_run, status)
             VALUES (?1, ?2, 1, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                new.name,
                new.frequency.as_str(),
                new.day_of_week,
                new.time_of_day,
                new.kind.as_str(),
                serde_json::to_string(&new.topics)?,
                new.auto_publish,
                new.user_id,
                next_run.map(|dt| dt.to_rfc3339()),
                ScheduleStatus::Active.as_str()
            ],
        )?;

        Ok(ScheduleRecord {
            id,
            name: new.name,
            enabled: true,
            frequency: new.frequency,
            day_of_week: new.day_of_week,
            time_of_day: new.time_of_day,
            kind: new.kind,
            topics: new.topics,
            auto_publish: new.auto_publish,
            user_id: new.user_id,
            last_run: None,
            next_run,
            status: ScheduleStatus::Active,
        })
    }

    pub async fn get_schedule(&self, id: &str) -> Result<Option<ScheduleRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM schedules WHERE id = ?1",
            SCHEDULE_COLUMNS
        ))?;
        let mut rows = stmt.query_map([id], row_to_schedule)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub async fn list_schedules(&self) -> Result<Vec<ScheduleRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM schedules ORDER BY name",
            SCHEDULE_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_schedule)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Toggle sets both the flag and the matching active/paused status.
    pub async fn set_schedule_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let status = if enabled {
            ScheduleStatus::Active
        } else {
            ScheduleStatus::Paused
        };
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE schedules SET enabled = ?1, status = ?2 WHERE id = ?3",
            params![enabled, status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(anyhow!("schedule {} not found", id));
        }
        Ok(())
    }

    pub async fn apply_schedule_patch(&self, id: &str, patch: &SchedulePatch) -> Result<()> {
        let db = self.db.lock().await;

        if let Some(name) = &patch.name {
            db.execute("UPDATE schedules SET name = ?1 WHERE id = ?2", params![name, id])?;
        }
        if let Some(frequency) = patch.frequency {
            db.execute(
                "UPDATE schedules SET frequency = ?1 WHERE id = ?2",
                params![frequency.as_str(), id],
            )?;
        }
        if let Some(day_of_week) = patch.day_of_week {
            db.execute(
                "UPDATE schedules SET day_of_week = ?1 WHERE id = ?2",
                params![day_of_week, id],
            )?;
        }
        if let Some(time_of_day) = &patch.time_of_day {
            db.execute(
                "UPDATE schedules SET time_of_day = ?1 WHERE id = ?2",
                params![time_of_day, id],
            )?;
        }
        if let Some(kind) = patch.kind {
            db.execute(
                "UPDATE schedules SET kind = ?1 WHERE id = ?2",
                params![kind.as_str(), id],
            )?;
        }
        if let Some(topics) = &patch.topics {
            db.execute(
                "UPDATE schedules SET topics = ?1 WHERE id = ?2",
                params![serde_json::to_string(topics)?, id],
            )?;
        }
        if let Some(auto_publish) = patch.auto_publish {
            db.execute(
                "UPDATE schedules SET auto_publish = ?1 WHERE id = ?2",
                params![auto_publish, id],
            )?;
        }
        Ok(())
    }

    pub async fn set_schedule_next_run(
        &self,
        id: &str,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE schedules SET next_run = ?1 WHERE id = ?2",
            params![next_run.map(|dt| dt.to_rfc3339()), id],
        )?;
        Ok(())
    }

    /// Record one execution outcome: last run, recomputed next run, and the
    /// resulting status (active on success, error on failure).
    pub async fn record_schedule_run(
        &self,
        id: &str,
        last_run: DateTime<Utc>,
        next_run: Option<DateTime<Utc>>,
        status: ScheduleStatus,
    ) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE schedules SET last_run = ?1, next_run = ?2, status = ?3 WHERE id = ?4",
            params![
                last_run.to_rfc3339(),
                next_run.map(|dt| dt.to_rfc3339()),
                status.as_str(),
                id
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("schedule {} not found", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewSchedule {
        NewSchedule {
            name: "weekly blog".to_string(),
            frequency: Frequency::Weekly,
            day_of_week: Some(1),
            time_of_day: "10:00".to_string(),
            kind: AssetKind::Blog,
            topics: vec!["onboarding".to_string(), "pricing".to_string()],
            auto_publish: false,
            user_id: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_fetch_schedule() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_schedule(sample(), None).await.unwrap();

        let fetched = store.get_schedule(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "weekly blog");
        assert_eq!(fetched.frequency, Frequency::Weekly);
        assert_eq!(fetched.day_of_week, Some(1));
        assert_eq!(fetched.topics, vec!["onboarding", "pricing"]);
        assert!(fetched.enabled);
        assert_eq!(fetched.status, ScheduleStatus::Active);
    }

    #[tokio::test]
    async fn toggle_pauses_and_resumes() {
        let store = Store::open_in_memory().unwrap();
        let schedule = store.create_schedule(sample(), None).await.unwrap();

        store.set_schedule_enabled(&schedule.id, false).await.unwrap();
        let paused = store.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert!(!paused.enabled);
        assert_eq!(paused.status, ScheduleStatus::Paused);

        store.set_schedule_enabled(&schedule.id, true).await.unwrap();
        let active = store.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert!(active.enabled);
        assert_eq!(active.status, ScheduleStatus::Active);
    }

    #[tokio::test]
    async fn run_outcome_updates_timestamps_and_status() {
        let store = Store::open_in_memory().unwrap();
        let schedule = store.create_schedule(sample(), None).await.unwrap();

        let ran_at = Utc::now();
        let next = ran_at + chrono::Duration::days(7);
        store
            .record_schedule_run(&schedule.id, ran_at, Some(next), ScheduleStatus::Error)
            .await
            .unwrap();

        let fetched = store.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ScheduleStatus::Error);
        assert_eq!(fetched.last_run.unwrap().timestamp(), ran_at.timestamp());
        assert_eq!(fetched.next_run.unwrap().timestamp(), next.timestamp());
    }

    #[tokio::test]
    async fn patch_updates_only_named_fields() {
        let store = Store::open_in_memory().unwrap();
        let schedule = store.create_schedule(sample(), None).await.unwrap();

        store
            .apply_schedule_patch(
                &schedule.id,
                &SchedulePatch {
                    frequency: Some(Frequency::Daily),
                    day_of_week: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = store.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert_eq!(fetched.frequency, Frequency::Daily);
        assert_eq!(fetched.day_of_week, None);
        assert_eq!(fetched.time_of_day, "10:00");
        assert_eq!(fetched.name, "weekly blog");
    }
}
