//! SQLite-backed state store

use crate::core::{RecordSet, RunRecord};
use crate::store::{StateStore, StoreError};
use sqlx::{Row, SqlitePool};

/// SQLite state store
///
/// The comments/articles/consultations tables are populated by the
/// crawler; this store only reads them. The schedules table is owned here
/// and records run history.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Open a store at the given path, creating missing tables
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path)).await?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Open a store at the platform-local data directory
    pub async fn with_default_path() -> Result<Self, StoreError> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("opengov-pipeline");
        std::fs::create_dir_all(&db_dir)
            .map_err(|e| StoreError::Unavailable(format!("cannot create data dir: {}", e)))?;

        let db_path = db_dir.join("consultations.db");
        Self::new(&db_path.to_string_lossy()).await
    }

    /// Open an in-process store, used by tests
    ///
    /// A single pooled connection, since every connection to `:memory:`
    /// gets its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize database schema
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS consultations (
                id INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                consultation_id INTEGER NOT NULL REFERENCES consultations(id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY,
                article_id INTEGER NOT NULL REFERENCES articles(id)
            );

            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                total_steps INTEGER NOT NULL,
                watermark INTEGER NOT NULL,
                date_init TEXT NOT NULL,
                date_end TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_comments_article ON comments(article_id);
            CREATE INDEX IF NOT EXISTS idx_articles_consultation ON articles(consultation_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for SqliteStateStore {
    async fn latest_watermark(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT id FROM comments ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<i64, _>("id")).unwrap_or(0))
    }

    async fn consultations_changed_since(&self, watermark: i64) -> Result<RecordSet, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT consultations.id AS id
            FROM consultations
            INNER JOIN articles ON articles.consultation_id = consultations.id
            INNER JOIN comments ON comments.article_id = articles.id
            WHERE comments.id > ?1
            ORDER BY consultations.id DESC
            "#,
        )
        .bind(watermark)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get::<i64, _>("id")).collect())
    }

    async fn record_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO schedules (id, total_steps, watermark, date_init, date_end)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(record.run_id.to_string())
        .bind(record.total_steps as i64)
        .bind(record.watermark)
        .bind(record.started_at.to_rfc3339())
        .bind(record.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
