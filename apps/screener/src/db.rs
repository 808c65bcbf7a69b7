use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::pipeline::worklist::{WorklistItem, WorklistSource};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Persists the outcome of one scored résumé.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Records the match and marks the row processed. Returns `false` when the
    /// row was already processed (or does not exist).
    async fn record_match(&self, id: i64, overall_match: u32) -> Result<bool, AppError>;
}

/// `resume_details` table: unprocessed rows have `flag = 'N'`.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct ResumeDetailsRow {
    id: i64,
    applicant: Option<String>,
    position: Option<String>,
    resume: Option<String>,
    jobdescription: Option<String>,
}

impl From<ResumeDetailsRow> for WorklistItem {
    fn from(row: ResumeDetailsRow) -> Self {
        WorklistItem {
            id: Some(row.id),
            applicant: row.applicant.unwrap_or_default(),
            position: row.position.unwrap_or_default(),
            resume_path: row.resume.unwrap_or_default(),
            job_description: row.jobdescription.unwrap_or_default(),
        }
    }
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorklistSource for PgResumeStore {
    async fn load(&self) -> Result<Vec<WorklistItem>, AppError> {
        let rows = sqlx::query_as::<_, ResumeDetailsRow>(
            r#"
            SELECT id, applicant, position, resume, jobdescription
            FROM resume_details
            WHERE flag = 'N'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Worklist(format!("resume_details: {e}")))?;

        info!("Loaded {} unprocessed rows from resume_details", rows.len());
        Ok(rows.into_iter().map(WorklistItem::from).collect())
    }
}

#[async_trait]
impl ScoreStore for PgResumeStore {
    async fn record_match(&self, id: i64, overall_match: u32) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE resume_details
            SET percentage_match = $1, flag = 'Y'
            WHERE id = $2 AND flag = 'N'
            "#,
        )
        .bind(overall_match as i32)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
