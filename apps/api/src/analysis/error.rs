use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::analysis::normalizer::ParseError;
use crate::ingest::ExtractionError;
use crate::llm_client::ProviderError;

/// Every way an analysis cycle can fail. Cloneable so the controller can keep
/// a copy in its Failed state while also returning it to the caller.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("provider request failed: {0}")]
    RequestFailed(Arc<ProviderError>),

    #[error("model response rejected: {0}")]
    Parse(#[from] ParseError),

    #[error("an analysis is already in progress")]
    AlreadyInProgress,

    #[error("analysis timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("analysis was abandoned before the provider responded")]
    Abandoned,
}

impl From<ProviderError> for AnalysisError {
    fn from(e: ProviderError) -> Self {
        AnalysisError::RequestFailed(Arc::new(e))
    }
}

impl From<ExtractionError> for AnalysisError {
    fn from(e: ExtractionError) -> Self {
        AnalysisError::ExtractionFailed(e.to_string())
    }
}

impl AnalysisError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "INVALID_INPUT",
            AnalysisError::RequestFailed(_) => "REQUEST_FAILED",
            AnalysisError::Parse(_) => "PARSE_ERROR",
            AnalysisError::AlreadyInProgress => "ALREADY_IN_PROGRESS",
            AnalysisError::Timeout(_) => "TIMEOUT",
            AnalysisError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            AnalysisError::Abandoned => "ABANDONED",
        }
    }

    /// Message safe to show an end user. Provider details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::InvalidInput(_) => {
                "Please provide both your CV and the job description.".to_string()
            }
            AnalysisError::RequestFailed(_) => {
                "The AI provider could not be reached. Please try again.".to_string()
            }
            AnalysisError::Parse(_) => {
                "The AI returned an unexpected answer. Please try again.".to_string()
            }
            AnalysisError::AlreadyInProgress => {
                "An analysis is already running. Please wait for it to finish.".to_string()
            }
            AnalysisError::Timeout(_) => {
                "The analysis took too long. Please try again.".to_string()
            }
            AnalysisError::ExtractionFailed(reason) => {
                format!("We could not read the uploaded file: {reason}")
            }
            AnalysisError::Abandoned => "The analysis was cancelled.".to_string(),
        }
    }
}
