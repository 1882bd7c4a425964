mod types;

pub use types::{RunReport, RunnerError, TaskOutcome, can_transition};

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::agents::{AgentContext, AgentRegistry};
use crate::core::store::Store;
use crate::core::store::types::{CampaignStatus, TaskStatus};

/// Drives a campaign through its agent chain sequentially. One agent's
/// failure never aborts the run: the task is recorded as errored and the
/// chain moves on, so a campaign always ends in `completed` with whatever
/// assets its agents managed to produce.
pub struct AgentRunner {
    store: Arc<Store>,
    registry: Arc<AgentRegistry>,
    agent_deadline: Duration,
}

impl AgentRunner {
    pub fn new(store: Arc<Store>, registry: Arc<AgentRegistry>, agent_deadline: Duration) -> Self {
        Self {
            store,
            registry,
            agent_deadline,
        }
    }

    /// Run the named agents against one campaign. An unknown campaign id is
    /// the only fatal precondition; everything after that is recorded per
    /// task. Cancellation stops further dispatch but still closes the run
    /// out cleanly.
    pub async fn run_campaign(
        &self,
        campaign_id: &str,
        order: &[&str],
        cancel: CancellationToken,
    ) -> Result<RunReport, RunnerError> {
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| RunnerError::CampaignNotFound(campaign_id.to_string()))?;

        self.store
            .set_campaign_status(campaign_id, CampaignStatus::Running)
            .await?;
        self.store
            .record_audit(
                Some(campaign_id),
                "run_started",
                &json!({"agents": order}),
            )
            .await?;
        info!(campaign_id, agents = ?order, "Campaign run started");

        let ctx = AgentContext::from(&campaign);
        let input_snapshot = serde_json::to_string(&ctx).map_err(anyhow::Error::from)?;

        let mut report = RunReport {
            campaign_id: campaign_id.to_string(),
            ..Default::default()
        };

        for agent_name in order {
            if cancel.is_cancelled() {
                info!(campaign_id, "Run cancelled, skipping remaining agents");
                report.cancelled = true;
                break;
            }

            let task = self
                .store
                .create_task(campaign_id, agent_name, &input_snapshot)
                .await?;

            let Some(agent) = self.registry.get(agent_name) else {
                let message = format!("unknown agent: {}", agent_name);
                warn!(campaign_id, agent = agent_name, "{}", message);
                self.store.mark_task_error(&task.id, &message, 0).await?;
                self.store
                    .record_audit(
                        Some(campaign_id),
                        "agent_error",
                        &json!({"agent": agent_name, "error": message, "latency_ms": 0}),
                    )
                    .await?;
                report.outcomes.push(TaskOutcome {
                    agent: agent_name.to_string(),
                    task_id: task.id,
                    status: TaskStatus::Error,
                    assets: 0,
                    error: Some(message),
                });
                continue;
            };

            self.store.mark_task_running(&task.id).await?;
            let started = Instant::now();

            let run = tokio::time::timeout(self.agent_deadline, agent.run(&ctx)).await;
            let latency_ms = started.elapsed().as_millis() as i64;

            match run {
                Ok(Ok(result)) => {
                    for draft in &result.assets {
                        self.store
                            .insert_asset(
                                Some(campaign_id),
                                draft.kind,
                                &draft.title,
                                &draft.body,
                                draft.metadata.clone(),
                            )
                            .await?;
                    }
                    let output_snapshot = json!({
                        "assets": result.assets.len(),
                        "kinds": result
                            .assets
                            .iter()
                            .map(|a| a.kind.as_str())
                            .collect::<Vec<_>>(),
                    });
                    self.store
                        .mark_task_done(
                            &task.id,
                            result.tokens_in as i64,
                            result.tokens_out as i64,
                            latency_ms,
                            &output_snapshot.to_string(),
                        )
                        .await?;
                    self.store
                        .record_audit(
                            Some(campaign_id),
                            "agent_done",
                            &json!({
                                "agent": agent_name,
                                "assets": result.assets.len(),
                                "tokens_in": result.tokens_in,
                                "tokens_out": result.tokens_out,
                                "latency_ms": latency_ms,
                            }),
                        )
                        .await?;
                    info!(
                        campaign_id,
                        agent = agent_name,
                        assets = result.assets.len(),
                        tokens_in = result.tokens_in,
                        tokens_out = result.tokens_out,
                        latency_ms,
                        "Agent finished"
                    );
                    report.assets_created += result.assets.len();
                    report.outcomes.push(TaskOutcome {
                        agent: agent_name.to_string(),
                        task_id: task.id,
                        status: TaskStatus::Done,
                        assets: result.assets.len(),
                        error: None,
                    });
                }
                Ok(Err(e)) => {
                    let message = e.to_string();
                    warn!(campaign_id, agent = agent_name, "Agent failed: {}", message);
                    self.store
                        .mark_task_error(&task.id, &message, latency_ms)
                        .await?;
                    self.store
                        .record_audit(
                            Some(campaign_id),
                            "agent_error",
                            &json!({
                                "agent": agent_name,
                                "error": message,
                                "latency_ms": latency_ms,
                            }),
                        )
                        .await?;
                    report.outcomes.push(TaskOutcome {
                        agent: agent_name.to_string(),
                        task_id: task.id,
                        status: TaskStatus::Error,
                        assets: 0,
                        error: Some(message),
                    });
                }
                Err(_) => {
                    let message = format!(
                        "agent deadline exceeded ({}s)",
                        self.agent_deadline.as_secs()
                    );
                    warn!(campaign_id, agent = agent_name, "{}", message);
                    self.store
                        .mark_task_error(&task.id, &message, latency_ms)
                        .await?;
                    self.store
                        .record_audit(
                            Some(campaign_id),
                            "agent_error",
                            &json!({
                                "agent": agent_name,
                                "error": message,
                                "latency_ms": latency_ms,
                            }),
                        )
                        .await?;
                    report.outcomes.push(TaskOutcome {
                        agent: agent_name.to_string(),
                        task_id: task.id,
                        status: TaskStatus::Error,
                        assets: 0,
                        error: Some(message),
                    });
                }
            }
        }

        self.store
            .set_campaign_status(campaign_id, CampaignStatus::Completed)
            .await?;
        self.store
            .record_audit(
                Some(campaign_id),
                "run_completed",
                &json!({
                    "assets_created": report.assets_created,
                    "failed_agents": report.failed_agents(),
                    "cancelled": report.cancelled,
                }),
            )
            .await?;
        info!(
            campaign_id,
            assets = report.assets_created,
            failed = report.failed_agents().len(),
            "Campaign run completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests;
