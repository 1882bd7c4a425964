mod assets;
mod audit;
mod campaigns;
mod credentials;
mod jobs;
mod schedules;
mod tasks;
pub mod types;

pub use assets::derive_metadata;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Sqlite-backed persistence for the orchestration core. All mutations are
/// single-row writes serialized behind one connection lock.
pub struct Store {
    db: Arc<Mutex<Connection>>,
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                objective TEXT NOT NULL,
                audience TEXT NOT NULL,
                brand_voice TEXT NOT NULL,
                channels TEXT NOT NULL,
                target_length INTEGER,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS agent_tasks (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL,
                agent TEXT NOT NULL,
                status TEXT NOT NULL,
                input_snapshot TEXT NOT NULL,
                output_snapshot TEXT,
                tokens_in INTEGER NOT NULL DEFAULT 0,
                tokens_out INTEGER NOT NULL DEFAULT 0,
                latency_ms INTEGER NOT NULL DEFAULT 0,
                error TEXT,
                created_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS content_assets (
                id TEXT PRIMARY KEY,
                campaign_id TEXT,
                lineage_id TEXT NOT NULL,
                version INTEGER NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                metadata TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (lineage_id, version)
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS oauth_credentials (
                platform TEXT NOT NULL,
                user_id TEXT NOT NULL,
                encrypted_token TEXT NOT NULL,
                expires_at TEXT,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (platform, user_id)
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS publish_jobs (
                id TEXT PRIMARY KEY,
                asset_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                status TEXT NOT NULL,
                scheduled_at TEXT,
                posted_at TEXT,
                url TEXT,
                error TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                frequency TEXT NOT NULL,
                day_of_week INTEGER,
                time_of_day TEXT NOT NULL,
                kind TEXT NOT NULL,
                topics TEXT NOT NULL,
                auto_publish INTEGER NOT NULL DEFAULT 0,
                user_id TEXT NOT NULL,
                last_run TEXT,
                next_run TEXT,
                status TEXT NOT NULL
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS audit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id TEXT,
                kind TEXT NOT NULL,
                detail TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}
