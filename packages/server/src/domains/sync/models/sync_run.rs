use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// SyncRun - one row of `sync_log`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncRun {
    pub id: Uuid,
    pub status: String, // 'running', 'completed', 'failed'
    pub listings_synced: i32,
    pub photos_synced: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Running => write!(f, "running"),
            SyncStatus::Completed => write!(f, "completed"),
            SyncStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(SyncStatus::Running),
            "completed" => Ok(SyncStatus::Completed),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid sync status: {}", s)),
        }
    }
}

impl SyncRun {
    /// A fresh run in the `running` state
    pub fn started() -> Self {
        Self {
            id: Uuid::now_v7(),
            status: SyncStatus::Running.to_string(),
            listings_synced: 0,
            photos_synced: 0,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SyncStatus::Running.to_string()
    }

    // =========================================================================
    // SQL Queries - ALL queries must be in models/
    // =========================================================================

    pub async fn create(pool: &PgPool) -> Result<Self> {
        let run = Self::started();

        sqlx::query_as::<_, SyncRun>(
            r#"
            INSERT INTO sync_log (id, status, listings_synced, photos_synced, started_at)
            VALUES ($1, $2, 0, 0, $3)
            RETURNING *
            "#,
        )
        .bind(run.id)
        .bind(&run.status)
        .bind(run.started_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Move a running row to `completed`. Rows already finished are left alone.
    pub async fn complete(
        id: Uuid,
        listings_synced: i32,
        photos_synced: i32,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sync_log
            SET status = 'completed',
                completed_at = NOW(),
                listings_synced = $2,
                photos_synced = $3
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(listings_synced)
        .bind(photos_synced)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Move a running row to `failed`. Rows already finished are left alone.
    pub async fn fail(
        id: Uuid,
        error_message: &str,
        listings_synced: i32,
        photos_synced: i32,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sync_log
            SET status = 'failed',
                completed_at = NOW(),
                error_message = $2,
                listings_synced = $3,
                photos_synced = $4
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(error_message)
        .bind(listings_synced)
        .bind(photos_synced)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_latest(pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, SyncRun>("SELECT * FROM sync_log ORDER BY started_at DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_run_is_running_and_empty() {
        let run = SyncRun::started();
        assert!(run.is_running());
        assert_eq!(run.listings_synced, 0);
        assert!(run.completed_at.is_none());
    }

    #[test]
    fn status_strings() {
        assert_eq!(SyncStatus::Completed.to_string(), "completed");
        assert_eq!("failed".parse::<SyncStatus>().unwrap(), SyncStatus::Failed);
        assert!("done".parse::<SyncStatus>().is_err());
    }
}
