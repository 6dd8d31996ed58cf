// Match analysis: prompt building, response normalization and the request state machine.
// All provider calls go through llm_client; nothing here speaks HTTP directly.

pub mod controller;
pub mod error;
pub mod handlers;
pub mod model;
pub mod normalizer;
pub mod prompts;
pub mod sessions;

use serde::Deserialize;

use crate::analysis::prompts::PromptSchema;

/// One résumé/job-description pair to score. Consumed by a single request cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub schema: PromptSchema,
}

impl AnalysisRequest {
    pub fn new(resume_text: impl Into<String>, job_description: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            job_description: job_description.into(),
            schema: PromptSchema::default(),
        }
    }

    pub fn with_schema(mut self, schema: PromptSchema) -> Self {
        self.schema = schema;
        self
    }
}
