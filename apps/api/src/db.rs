use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        config_key   TEXT PRIMARY KEY,
        config_value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS candidates (
        id                      UUID PRIMARY KEY,
        name                    TEXT NOT NULL,
        resume_text             TEXT NOT NULL,
        job_description         TEXT NOT NULL,
        match_percentage        INTEGER NOT NULL CHECK (match_percentage BETWEEN 0 AND 100),
        matched_skills          TEXT NOT NULL,
        missing_skills          TEXT NOT NULL,
        improvement_suggestions TEXT NOT NULL,
        learning_resources      TEXT NOT NULL,
        status                  TEXT NOT NULL,
        processed_at            TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Creates the settings and candidates tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to create database schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
