use thiserror::Error;

use crate::core::store::types::TaskStatus;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("campaign {0} not found")]
    CampaignNotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Legal task transitions. The store enforces these in SQL too; this is the
/// single place the shape of the state machine is written down.
pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
    matches!(
        (from, to),
        (TaskStatus::Queued, TaskStatus::Running)
            | (TaskStatus::Queued, TaskStatus::Error)
            | (TaskStatus::Running, TaskStatus::Done)
            | (TaskStatus::Running, TaskStatus::Error)
    )
}

/// Outcome of one agent slot in a campaign run.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub agent: String,
    pub task_id: String,
    pub status: TaskStatus,
    pub assets: usize,
    pub error: Option<String>,
}

/// What a full campaign run produced, returned to the caller after the
/// campaign has been marked completed.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub campaign_id: String,
    pub outcomes: Vec<TaskOutcome>,
    pub assets_created: usize,
    pub cancelled: bool,
}

impl RunReport {
    pub fn failed_agents(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Error)
            .map(|o| o.agent.as_str())
            .collect()
    }
}
