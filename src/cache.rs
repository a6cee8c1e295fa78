//! Durable guide cache keyed by task identity plus generation parameters.
//!
//! Uniqueness of the four key columns is enforced by SQLite itself, and writes
//! go through a single `INSERT .. ON CONFLICT DO UPDATE`, so concurrent saves
//! of one key merge into one row instead of racing a lookup.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("cache schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored timestamp {0} is out of range")]
    CorruptTimestamp(i64),
}

// Exact-match identity of a cached guide; no trimming or case folding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub task_name: String,
    pub task_description: String,
    pub is_advanced: bool,
    pub model_name: String,
}

impl CacheKey {
    pub fn new(
        task_name: impl Into<String>,
        task_description: impl Into<String>,
        is_advanced: bool,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            task_description: task_description.into(),
            is_advanced,
            model_name: model_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGuide {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub total: u64,
    pub normal: u64,
    pub advanced: u64,
}

#[derive(sqlx::FromRow)]
struct GuideRow {
    guide_content: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<GuideRow> for CachedGuide {
    type Error = CacheError;

    fn try_from(row: GuideRow) -> Result<Self, Self::Error> {
        Ok(Self {
            content: row.guide_content,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, CacheError> {
    DateTime::from_timestamp_millis(millis).ok_or(CacheError::CorruptTimestamp(millis))
}

#[derive(Clone)]
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    /// Open (creating if needed) the database at `url` and apply migrations.
    pub async fn open(url: &str, max_connections: u32) -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(url, max_connections, "guide cache ready");

        Ok(Self { pool })
    }

    pub async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedGuide>, CacheError> {
        let row = sqlx::query_as::<_, GuideRow>(
            r#"
            SELECT guide_content, created_at, updated_at
            FROM task_guides
            WHERE task_name = ?
              AND task_description = ?
              AND is_advanced = ?
              AND model_name = ?
            "#,
        )
        .bind(&key.task_name)
        .bind(&key.task_description)
        .bind(key.is_advanced)
        .bind(&key.model_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CachedGuide::try_from).transpose()
    }

    /// Insert or overwrite. `created_at` survives overwrites; `updated_at` never moves backwards.
    pub async fn upsert(&self, key: &CacheKey, content: &str) -> Result<(), CacheError> {
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO task_guides
                (task_name, task_description, is_advanced, model_name, guide_content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (task_name, task_description, is_advanced, model_name) DO UPDATE SET
                guide_content = excluded.guide_content,
                updated_at = MAX(task_guides.updated_at, excluded.updated_at)
            "#,
        )
        .bind(&key.task_name)
        .bind(&key.task_description)
        .bind(key.is_advanced)
        .bind(&key.model_name)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(task = %key.task_name, model = %key.model_name, advanced = key.is_advanced, "guide saved");
        Ok(())
    }

    /// Returns whether a row was removed; an absent key is not an error.
    pub async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let result = sqlx::query(
            r#"
            DELETE FROM task_guides
            WHERE task_name = ?
              AND task_description = ?
              AND is_advanced = ?
              AND model_name = ?
            "#,
        )
        .bind(&key.task_name)
        .bind(&key.task_description)
        .bind(key.is_advanced)
        .bind(&key.model_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // One aggregate query, so normal + advanced always equals total.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let (total, advanced): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_advanced THEN 1 ELSE 0 END), 0) FROM task_guides",
        )
        .fetch_one(&self.pool)
        .await?;

        let total = total.max(0) as u64;
        let advanced = advanced.max(0) as u64;
        Ok(CacheStats {
            total,
            normal: total - advanced,
            advanced,
        })
    }

    pub async fn health_check(&self) -> Result<(), CacheError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
