use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Running,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Running => "running",
            CampaignStatus::Completed => "completed",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(CampaignStatus::Draft),
            "running" => Some(CampaignStatus::Running),
            "completed" => Some(CampaignStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(TaskStatus::Queued),
            "running" => Some(TaskStatus::Running),
            "done" => Some(TaskStatus::Done),
            "error" => Some(TaskStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Blog,
    Email,
    Social,
    VideoScript,
    ImagePrompt,
    Strategy,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Blog => "blog",
            AssetKind::Email => "email",
            AssetKind::Social => "social",
            AssetKind::VideoScript => "video_script",
            AssetKind::ImagePrompt => "image_prompt",
            AssetKind::Strategy => "strategy",
        }
    }

    pub fn from_kind(value: &str) -> Option<Self> {
        match value {
            "blog" => Some(AssetKind::Blog),
            "email" => Some(AssetKind::Email),
            "social" => Some(AssetKind::Social),
            "video_script" => Some(AssetKind::VideoScript),
            "image_prompt" => Some(AssetKind::ImagePrompt),
            "strategy" => Some(AssetKind::Strategy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Posting,
    Success,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Posting => "posting",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(JobStatus::Queued),
            "posting" => Some(JobStatus::Posting),
            "success" => Some(JobStatus::Success),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Paused,
    Error,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Paused => "paused",
            ScheduleStatus::Error => "error",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ScheduleStatus::Active),
            "paused" => Some(ScheduleStatus::Paused),
            "error" => Some(ScheduleStatus::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn from_frequency(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "biweekly" => Some(Frequency::Biweekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CampaignRecord {
    pub id: String,
    pub title: String,
    pub objective: String,
    pub audience: String,
    pub brand_voice: String,
    pub channels: Vec<String>,
    pub target_length: Option<u32>,
    pub status: CampaignStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewCampaign {
    pub title: String,
    pub objective: String,
    pub audience: String,
    pub brand_voice: String,
    pub channels: Vec<String>,
    pub target_length: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AgentTaskRecord {
    pub id: String,
    pub campaign_id: String,
    pub agent: String,
    pub status: TaskStatus,
    pub input_snapshot: String,
    pub output_snapshot: Option<String>,
    pub tokens_in: i64,
    pub tokens_out: i64,
    pub latency_ms: i64,
    pub error: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContentAssetRecord {
    pub id: String,
    pub campaign_id: Option<String>,
    pub lineage_id: String,
    pub version: i64,
    pub kind: AssetKind,
    pub title: String,
    pub body: String,
    pub metadata: serde_json::Value,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update for `save_asset`. Unset fields carry forward.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    pub id: String,
    pub version: i64,
}

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub platform: String,
    pub user_id: String,
    pub encrypted_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PublishJobRecord {
    pub id: String,
    pub asset_id: String,
    pub platform: String,
    pub status: JobStatus,
    pub scheduled_at: Option<String>,
    pub posted_at: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleRecord {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub frequency: Frequency,
    pub day_of_week: Option<u8>,
    pub time_of_day: String,
    pub kind: AssetKind,
    pub topics: Vec<String>,
    pub auto_publish: bool,
    pub user_id: String,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub frequency: Frequency,
    pub day_of_week: Option<u8>,
    pub time_of_day: String,
    pub kind: AssetKind,
    pub topics: Vec<String>,
    pub auto_publish: bool,
    pub user_id: String,
}

/// Partial update for schedules; `update_schedule` recomputes `next_run`
/// when timing fields change.
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub day_of_week: Option<Option<u8>>,
    pub time_of_day: Option<String>,
    pub kind: Option<AssetKind>,
    pub topics: Option<Vec<String>>,
    pub auto_publish: Option<bool>,
}

impl SchedulePatch {
    pub fn changes_timing(&self) -> bool {
        self.frequency.is_some() || self.day_of_week.is_some() || self.time_of_day.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AuditEventRecord {
    pub id: i64,
    pub campaign_id: Option<String>,
    pub kind: String,
    pub detail: serde_json::Value,
    pub created_at: String,
}
