use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::model::AnalysisResult;

/// A screened résumé as stored in the `candidates` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: Uuid,
    pub name: String,
    pub resume_text: String,
    pub job_description: String,
    pub match_percentage: i32,
    /// Comma-separated, as shown in the candidates table.
    pub matched_skills: String,
    pub missing_skills: String,
    pub improvement_suggestions: String,
    pub learning_resources: String,
    /// Screening status, or the match label for coaching results.
    pub status: String,
    pub processed_at: DateTime<Utc>,
}

impl CandidateRecord {
    pub fn from_analysis(
        name: impl Into<String>,
        resume_text: impl Into<String>,
        job_description: impl Into<String>,
        result: &AnalysisResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            resume_text: resume_text.into(),
            job_description: job_description.into(),
            match_percentage: i32::from(result.match_percentage()),
            matched_skills: result.strengths().join(", "),
            missing_skills: result.gaps().join(", "),
            improvement_suggestions: result.advice().to_string(),
            learning_resources: result.learning_resources(),
            status: result.verdict().to_string(),
            processed_at: Utc::now(),
        }
    }
}
