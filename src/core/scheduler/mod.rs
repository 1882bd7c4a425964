use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Months, Utc};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::publish::{PublisherRegistry, publish_asset};
use crate::core::runner::AgentRunner;
use crate::core::store::Store;
use crate::core::store::types::{
    AssetKind, Frequency, NewCampaign, NewSchedule, SchedulePatch, ScheduleRecord, ScheduleStatus,
};

/// Parse a `HH:MM` wall-clock string.
pub fn parse_time_of_day(value: &str) -> Result<(u32, u32)> {
    let (hour, minute) = value
        .split_once(':')
        .ok_or_else(|| anyhow!("time must be HH:MM, got {:?}", value))?;
    let hour: u32 = hour
        .parse()
        .with_context(|| format!("bad hour in {:?}", value))?;
    let minute: u32 = minute
        .parse()
        .with_context(|| format!("bad minute in {:?}", value))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow!("time out of range: {:?}", value));
    }
    Ok((hour, minute))
}

/// Next execution instant strictly after `now`. A slot landing exactly on
/// `now` rolls to the following period: the tick loop fires on
/// `next_run <= now` and immediately recomputes, so a strictly-future slot
/// is what keeps a single tick from firing the same schedule twice.
/// Day-of-week is 0 = Sunday. Biweekly is the weekly slot pushed out one
/// extra week; monthly keeps the day-of-month and clamps via calendar
/// arithmetic.
pub fn compute_next_run(
    now: DateTime<Utc>,
    frequency: Frequency,
    day_of_week: Option<u8>,
    time_of_day: &str,
) -> Result<DateTime<Utc>> {
    let (hour, minute) = parse_time_of_day(time_of_day)?;
    let today = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow!("invalid wall clock {}:{:02}", hour, minute))?
        .and_utc();

    match frequency {
        Frequency::Daily => {
            if today > now {
                Ok(today)
            } else {
                Ok(today + ChronoDuration::days(1))
            }
        }
        Frequency::Weekly | Frequency::Biweekly => {
            let target_dow = i64::from(day_of_week.unwrap_or(now.weekday().num_days_from_sunday() as u8));
            let current_dow = i64::from(now.weekday().num_days_from_sunday());
            let delta = (target_dow - current_dow).rem_euclid(7);
            let mut candidate = today + ChronoDuration::days(delta);
            if candidate <= now {
                candidate += ChronoDuration::days(7);
            }
            if frequency == Frequency::Biweekly {
                candidate += ChronoDuration::days(7);
            }
            Ok(candidate)
        }
        Frequency::Monthly => {
            if today > now {
                Ok(today)
            } else {
                today
                    .checked_add_months(Months::new(1))
                    .ok_or_else(|| anyhow!("next month is out of range"))
            }
        }
    }
}

fn channels_for_kind(kind: AssetKind) -> Vec<String> {
    match kind {
        AssetKind::Blog => vec!["blog".to_string()],
        AssetKind::Email => vec!["email".to_string()],
        _ => vec!["social".to_string()],
    }
}

fn agents_for_kind(kind: AssetKind) -> Vec<&'static str> {
    match kind {
        AssetKind::Blog => vec!["strategy", "copy"],
        _ => vec!["copy"],
    }
}

/// Turns schedule definitions into campaign runs. The daemon tick calls
/// `check_and_run_due`; everything else is plumbing for the CLI.
pub struct ContentScheduler {
    store: Arc<Store>,
    runner: Arc<AgentRunner>,
    publishers: Arc<PublisherRegistry>,
}

impl ContentScheduler {
    pub fn new(
        store: Arc<Store>,
        runner: Arc<AgentRunner>,
        publishers: Arc<PublisherRegistry>,
    ) -> Self {
        Self {
            store,
            runner,
            publishers,
        }
    }

    pub async fn create(&self, new: NewSchedule) -> Result<ScheduleRecord> {
        parse_time_of_day(&new.time_of_day)?;
        if let Some(dow) = new.day_of_week
            && dow > 6
        {
            return Err(anyhow!("day_of_week must be 0..=6, got {}", dow));
        }
        let next_run =
            compute_next_run(Utc::now(), new.frequency, new.day_of_week, &new.time_of_day)?;
        self.store.create_schedule(new, Some(next_run)).await
    }

    pub async fn get_all(&self) -> Result<Vec<ScheduleRecord>> {
        self.store.list_schedules().await
    }

    /// Pause or resume. Resuming recomputes the slot so a long-paused
    /// schedule does not fire immediately on a stale `next_run`.
    pub async fn toggle(&self, id: &str, enabled: bool) -> Result<()> {
        self.store.set_schedule_enabled(id, enabled).await?;
        if enabled {
            let schedule = self
                .store
                .get_schedule(id)
                .await?
                .ok_or_else(|| anyhow!("schedule {} not found", id))?;
            let next_run = compute_next_run(
                Utc::now(),
                schedule.frequency,
                schedule.day_of_week,
                &schedule.time_of_day,
            )?;
            self.store.set_schedule_next_run(id, Some(next_run)).await?;
        }
        Ok(())
    }

    pub async fn update(&self, id: &str, patch: SchedulePatch) -> Result<ScheduleRecord> {
        if let Some(time_of_day) = &patch.time_of_day {
            parse_time_of_day(time_of_day)?;
        }
        if let Some(Some(dow)) = patch.day_of_week
            && dow > 6
        {
            return Err(anyhow!("day_of_week must be 0..=6, got {}", dow));
        }
        let recompute = patch.changes_timing();
        self.store.apply_schedule_patch(id, &patch).await?;

        let schedule = self
            .store
            .get_schedule(id)
            .await?
            .ok_or_else(|| anyhow!("schedule {} not found", id))?;
        if recompute {
            let next_run = compute_next_run(
                Utc::now(),
                schedule.frequency,
                schedule.day_of_week,
                &schedule.time_of_day,
            )?;
            self.store.set_schedule_next_run(id, Some(next_run)).await?;
        }
        self.store
            .get_schedule(id)
            .await?
            .ok_or_else(|| anyhow!("schedule {} not found", id))
    }

    /// Run one schedule now. The outcome lands on the schedule row either
    /// way: a failed run flips the status to error instead of bubbling up.
    pub async fn execute(&self, id: &str) -> Result<ScheduleStatus> {
        let schedule = self
            .store
            .get_schedule(id)
            .await?
            .ok_or_else(|| anyhow!("schedule {} not found", id))?;

        let ran_at = Utc::now();
        let next_run = compute_next_run(
            ran_at,
            schedule.frequency,
            schedule.day_of_week,
            &schedule.time_of_day,
        )
        .ok();

        let status = match self.run_once(&schedule).await {
            Ok(campaign_id) => {
                info!(schedule = %schedule.name, campaign_id, "Scheduled run succeeded");
                ScheduleStatus::Active
            }
            Err(e) => {
                error!(schedule = %schedule.name, "Scheduled run failed: {}", e);
                ScheduleStatus::Error
            }
        };

        self.store
            .record_schedule_run(id, ran_at, next_run, status)
            .await?;
        Ok(status)
    }

    async fn run_once(&self, schedule: &ScheduleRecord) -> Result<String> {
        let topic = schedule
            .topics
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| schedule.name.clone());

        let campaign = self
            .store
            .create_campaign(NewCampaign {
                title: topic.clone(),
                objective: format!("Scheduled {} content: {}", schedule.kind.as_str(), topic),
                audience: "subscribers".to_string(),
                brand_voice: "consistent with past posts".to_string(),
                channels: channels_for_kind(schedule.kind),
                target_length: None,
            })
            .await?;

        let order = agents_for_kind(schedule.kind);
        self.runner
            .run_campaign(&campaign.id, &order, CancellationToken::new())
            .await?;

        if schedule.auto_publish && schedule.kind == AssetKind::Social {
            self.auto_publish_social(&campaign.id, &schedule.user_id)
                .await?;
        }

        Ok(campaign.id)
    }

    async fn auto_publish_social(&self, campaign_id: &str, user_id: &str) -> Result<()> {
        let assets = self.store.list_assets_for_campaign(campaign_id).await?;
        for asset in assets {
            if asset.kind != AssetKind::Social {
                continue;
            }
            let Some(platform) = asset.metadata["platform"].as_str() else {
                continue;
            };
            let platform = platform.to_string();
            let result = publish_asset(
                &self.store,
                &self.publishers,
                &asset.id,
                &platform,
                user_id,
                None,
            )
            .await?;
            if !result.success {
                warn!(
                    asset_id = %asset.id,
                    platform = %platform,
                    "Auto-publish failed: {}",
                    result.error.as_deref().unwrap_or("unknown")
                );
            }
        }
        Ok(())
    }

    /// One daemon tick: fire every enabled schedule whose slot has passed.
    /// Failures are isolated per schedule.
    pub async fn check_and_run_due(&self) -> Result<usize> {
        let now = Utc::now();
        let mut fired = 0;
        for schedule in self.store.list_schedules().await? {
            if !schedule.enabled || schedule.status != ScheduleStatus::Active {
                continue;
            }
            let Some(next_run) = schedule.next_run else {
                continue;
            };
            if next_run > now {
                continue;
            }
            match self.execute(&schedule.id).await {
                Ok(_) => fired += 1,
                Err(e) => error!(schedule = %schedule.name, "Scheduled run errored: {}", e),
            }
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests;
