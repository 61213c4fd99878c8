use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{ApplicationStore, StoreError};
use crate::models::config::BotConfig;
use crate::models::records::{
    BotStats, ChannelJobLog, DisposalRecord, HistoryRecord, PendingApplicationRecord, StatsDelta,
};

/// Id of the singleton config and stats documents.
const MAIN: &str = "main";

/// Document collections, one table each: `(id TEXT PRIMARY KEY, body JSONB, updated_at)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    BotConfig,
    PendingApplications,
    JobHistory,
    Disposal,
    ChannelJobLogs,
    BotStats,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::BotConfig,
        Collection::PendingApplications,
        Collection::JobHistory,
        Collection::Disposal,
        Collection::ChannelJobLogs,
        Collection::BotStats,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Collection::BotConfig => "bot_config",
            Collection::PendingApplications => "pending_applications",
            Collection::JobHistory => "job_history",
            Collection::Disposal => "disposals",
            Collection::ChannelJobLogs => "channel_job_logs",
            Collection::BotStats => "bot_stats",
        }
    }

    pub fn create_table_sql(self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                body JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            self.table()
        )
    }

    fn upsert_sql(self) -> String {
        format!(
            "INSERT INTO {} (id, body, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()",
            self.table()
        )
    }

    /// Inserts a document only when the id is free.
    fn seed_sql(self) -> String {
        format!(
            "INSERT INTO {} (id, body, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (id) DO NOTHING",
            self.table()
        )
    }
}

/// PostgreSQL-backed `ApplicationStore`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates any missing collection tables. Safe to run on every startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            sqlx::query(&collection.create_table_sql())
                .execute(&self.pool)
                .await?;
        }
        sqlx::query(&Collection::BotStats.seed_sql())
            .bind(MAIN)
            .bind(serde_json::to_value(BotStats::default())?)
            .execute(&self.pool)
            .await?;
        info!("Document store schema ready");
        Ok(())
    }

    async fn put_doc<T: Serialize + Sync>(
        &self,
        collection: Collection,
        id: &str,
        doc: &T,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_value(doc)?;
        sqlx::query(&collection.upsert_sql())
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await?;
        debug!("Stored {}/{}", collection.table(), id);
        Ok(())
    }

    async fn get_doc<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let sql = format!("SELECT body FROM {} WHERE id = $1", collection.table());
        let body: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body.map(serde_json::from_value).transpose()?)
    }

    async fn list_docs<T: DeserializeOwned>(
        &self,
        collection: Collection,
        limit: i64,
    ) -> Result<Vec<T>, StoreError> {
        let sql = format!(
            "SELECT body FROM {} ORDER BY updated_at DESC LIMIT $1",
            collection.table()
        );
        let bodies: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        bodies
            .into_iter()
            .map(|body| serde_json::from_value(body).map_err(StoreError::from))
            .collect()
    }

    async fn delete_doc(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn get_config(&self) -> Result<Option<BotConfig>, StoreError> {
        self.get_doc(Collection::BotConfig, MAIN).await
    }

    async fn put_config(&self, config: &BotConfig) -> Result<(), StoreError> {
        self.put_doc(Collection::BotConfig, MAIN, config).await
    }

    async fn set_channel_name(&self, name: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bot_config (id, body, updated_at)
            VALUES ($1, jsonb_build_object('channelName', $2::text), NOW())
            ON CONFLICT (id) DO UPDATE
            SET body = bot_config.body || EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(MAIN)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put_pending(&self, record: &PendingApplicationRecord) -> Result<(), StoreError> {
        self.put_doc(Collection::PendingApplications, &record.job_id, record)
            .await
    }

    async fn get_pending(&self, job_id: &str) -> Result<Option<PendingApplicationRecord>, StoreError> {
        self.get_doc(Collection::PendingApplications, job_id).await
    }

    async fn list_pending(&self) -> Result<Vec<PendingApplicationRecord>, StoreError> {
        self.list_docs(Collection::PendingApplications, i64::MAX).await
    }

    async fn delete_pending(&self, job_id: &str) -> Result<bool, StoreError> {
        self.delete_doc(Collection::PendingApplications, job_id).await
    }

    async fn put_history(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        self.put_doc(Collection::JobHistory, &record.job_id, record).await
    }

    async fn list_history(&self, limit: i64) -> Result<Vec<HistoryRecord>, StoreError> {
        self.list_docs(Collection::JobHistory, limit).await
    }

    async fn put_disposal(&self, record: &DisposalRecord) -> Result<(), StoreError> {
        self.put_doc(Collection::Disposal, &record.id.to_string(), record)
            .await
    }

    async fn put_channel_log(&self, log: &ChannelJobLog) -> Result<(), StoreError> {
        self.put_doc(Collection::ChannelJobLogs, &log.id.to_string(), log)
            .await
    }

    async fn record_stats(&self, delta: StatsDelta) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // The row must exist before it can be locked; a concurrent seed waits on the key.
        sqlx::query(&Collection::BotStats.seed_sql())
            .bind(MAIN)
            .bind(serde_json::to_value(BotStats::default())?)
            .execute(&mut *tx)
            .await?;
        let current: Value =
            sqlx::query_scalar("SELECT body FROM bot_stats WHERE id = $1 FOR UPDATE")
                .bind(MAIN)
                .fetch_one(&mut *tx)
                .await?;
        let mut stats: BotStats = serde_json::from_value(current)?;
        stats.apply(delta, Utc::now());

        sqlx::query(&Collection::BotStats.upsert_sql())
            .bind(MAIN)
            .bind(serde_json::to_value(&stats)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_stats(&self) -> Result<BotStats, StoreError> {
        Ok(self
            .get_doc(Collection::BotStats, MAIN)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_tables_are_distinct() {
        let mut tables: Vec<&str> = Collection::ALL.iter().map(|c| c.table()).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), Collection::ALL.len());
    }

    #[test]
    fn test_create_table_sql_is_idempotent() {
        let sql = Collection::PendingApplications.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS pending_applications"));
        assert!(sql.contains("body JSONB NOT NULL"));
    }

    #[test]
    fn test_stats_seed_never_overwrites() {
        let sql = Collection::BotStats.seed_sql();
        assert!(sql.contains("INSERT INTO bot_stats"));
        assert!(sql.contains("ON CONFLICT (id) DO NOTHING"));
    }

    #[test]
    fn test_upsert_overwrites_on_conflict() {
        let sql = Collection::JobHistory.upsert_sql();
        assert!(sql.contains("INSERT INTO job_history"));
        assert!(sql.contains("ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body"));
    }
}
