#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{AccessLog, AccessOutcome};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository trait for the access audit trail.
pub trait AccessLogRepository: Send + Sync {
    /// Create a new access log entry
    async fn create(&self, log: &AccessLog) -> StorageResult<i64>;

    /// Most recent entries, newest first
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Most recent entries for one identity, newest first
    async fn find_by_identity(&self, identity: &str, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Most recent entries with a given outcome, newest first
    async fn find_by_outcome(
        &self,
        outcome: AccessOutcome,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>>;

    /// Count entries within a time range
    async fn count_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<i64>;
}

/// SQLite implementation of AccessLogRepository
#[derive(Debug, Clone)]
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    /// Create a new SQLite access log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn create(&self, log: &AccessLog) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (
                identity, workflow, outcome, granted, message, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.identity)
        .bind(&log.workflow)
        .bind(&log.outcome)
        .bind(log.granted)
        .bind(&log.message)
        .bind(log.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, identity, workflow, outcome, granted,
                   message, timestamp, created_at
            FROM access_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_identity(&self, identity: &str, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, identity, workflow, outcome, granted,
                   message, timestamp, created_at
            FROM access_logs
            WHERE identity = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(identity)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_outcome(
        &self,
        outcome: AccessOutcome,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, identity, workflow, outcome, granted,
                   message, timestamp, created_at
            FROM access_logs
            WHERE outcome = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(outcome.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM access_logs
            WHERE timestamp >= ? AND timestamp <= ?
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use chrono::Duration;

    async fn setup() -> SqliteAccessLogRepository {
        let db = Database::in_memory().await.unwrap();
        SqliteAccessLogRepository::new(db.pool().clone())
    }

    fn log(identity: Option<&str>, outcome: AccessOutcome, at: DateTime<Utc>) -> AccessLog {
        AccessLog::new(
            identity.map(str::to_string),
            Some("unlock".to_string()),
            outcome,
            outcome.as_str(),
            at,
        )
    }

    #[tokio::test]
    async fn test_create_and_find_recent() {
        let repo = setup().await;
        let now = Utc::now();

        repo.create(&log(Some("alice"), AccessOutcome::Granted, now - Duration::seconds(10)))
            .await
            .unwrap();
        let id = repo
            .create(&log(None, AccessOutcome::NoFace, now))
            .await
            .unwrap();
        assert!(id > 0);

        let recent = repo.find_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].get_outcome(), Some(AccessOutcome::NoFace));
        assert!(recent[1].granted);
        assert_eq!(recent[1].identity.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_find_recent_respects_limit() {
        let repo = setup().await;
        let now = Utc::now();
        for i in 0..5 {
            repo.create(&log(None, AccessOutcome::NoMatch, now + Duration::seconds(i)))
                .await
                .unwrap();
        }

        assert_eq!(repo.find_recent(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_by_identity_and_outcome() {
        let repo = setup().await;
        let now = Utc::now();
        repo.create(&log(Some("alice"), AccessOutcome::Denied, now))
            .await
            .unwrap();
        repo.create(&log(Some("bob"), AccessOutcome::Granted, now))
            .await
            .unwrap();
        repo.create(&log(Some("alice"), AccessOutcome::Granted, now))
            .await
            .unwrap();

        assert_eq!(repo.find_by_identity("alice", 10).await.unwrap().len(), 2);
        let granted = repo
            .find_by_outcome(AccessOutcome::Granted, 10)
            .await
            .unwrap();
        assert_eq!(granted.len(), 2);
        assert!(granted.iter().all(|l| l.granted));
    }

    #[tokio::test]
    async fn test_count_by_time_range() {
        let repo = setup().await;
        let now = Utc::now();
        repo.create(&log(None, AccessOutcome::NoFace, now - Duration::hours(2)))
            .await
            .unwrap();
        repo.create(&log(None, AccessOutcome::NoFace, now))
            .await
            .unwrap();

        let count = repo
            .count_by_time_range(now - Duration::minutes(1), now + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
