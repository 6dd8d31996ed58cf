// Screened candidates: every analyzed upload is kept for the recruiter dashboard.

pub mod handlers;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;

use crate::models::candidate::CandidateRecord;

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn insert(&self, record: &CandidateRecord) -> Result<()>;

    /// All candidates, most recently processed first.
    async fn list(&self) -> Result<Vec<CandidateRecord>>;
}

pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn insert(&self, record: &CandidateRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO candidates
                (id, name, resume_text, job_description, match_percentage, matched_skills,
                 missing_skills, improvement_suggestions, learning_resources, status, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.resume_text)
        .bind(&record.job_description)
        .bind(record.match_percentage)
        .bind(&record.matched_skills)
        .bind(&record.missing_skills)
        .bind(&record.improvement_suggestions)
        .bind(&record.learning_resources)
        .bind(&record.status)
        .bind(record.processed_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert candidate")?;

        info!(candidate_id = %record.id, "candidate stored");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CandidateRecord>> {
        let records = sqlx::query_as::<_, CandidateRecord>(
            "SELECT * FROM candidates ORDER BY processed_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list candidates")?;
        Ok(records)
    }
}

#[derive(Default)]
pub struct MemoryCandidateRepository {
    records: RwLock<Vec<CandidateRecord>>,
}

#[async_trait]
impl CandidateRepository for MemoryCandidateRepository {
    async fn insert(&self, record: &CandidateRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CandidateRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        Ok(records)
    }
}
