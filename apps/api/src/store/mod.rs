//! Document store for configuration, the approval queue, history, and dashboard logs.
//!
//! Every collection is keyed by document id with overwrite-on-put semantics. Concurrent
//! writes to the same id are serialized by the database's per-row atomicity; the store
//! does not provide its own locking.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::config::BotConfig;
use crate::models::records::{
    BotStats, ChannelJobLog, DisposalRecord, HistoryRecord, PendingApplicationRecord, StatsDelta,
};

pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn get_config(&self) -> Result<Option<BotConfig>, StoreError>;
    async fn put_config(&self, config: &BotConfig) -> Result<(), StoreError>;
    /// Merges `channelName` into the config document, creating it if needed.
    async fn set_channel_name(&self, name: &str) -> Result<(), StoreError>;

    async fn put_pending(&self, record: &PendingApplicationRecord) -> Result<(), StoreError>;
    async fn get_pending(&self, job_id: &str) -> Result<Option<PendingApplicationRecord>, StoreError>;
    async fn list_pending(&self) -> Result<Vec<PendingApplicationRecord>, StoreError>;
    /// Returns whether a record was removed.
    async fn delete_pending(&self, job_id: &str) -> Result<bool, StoreError>;

    async fn put_history(&self, record: &HistoryRecord) -> Result<(), StoreError>;
    /// Most recent first.
    async fn list_history(&self, limit: i64) -> Result<Vec<HistoryRecord>, StoreError>;

    async fn put_disposal(&self, record: &DisposalRecord) -> Result<(), StoreError>;
    async fn put_channel_log(&self, log: &ChannelJobLog) -> Result<(), StoreError>;

    async fn record_stats(&self, delta: StatsDelta) -> Result<(), StoreError>;
    async fn get_stats(&self) -> Result<BotStats, StoreError>;
}
