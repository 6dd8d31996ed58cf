//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::controller::AnalysisState;
use crate::analysis::error::AnalysisError;
use crate::analysis::model::AnalysisResult;
use crate::analysis::prompts::PromptSchema;
use crate::analysis::AnalysisRequest;
use crate::errors::AppError;
use crate::ingest::{extract_text, ExtractionError};
use crate::models::candidate::CandidateRecord;
use crate::settings::resolve_credential;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureBody>,
}

#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub code: &'static str,
    pub message: String,
}

impl SessionSnapshot {
    fn new(session_id: Uuid, state: &AnalysisState) -> Self {
        Self {
            session_id,
            state: state.label(),
            result: state.result().map(|r| r.as_ref().clone()),
            error: state.error().map(|e| FailureBody {
                code: e.code(),
                message: e.user_message(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let controller = state.new_controller();
    let snapshot = controller.snapshot();
    let session_id = state.sessions.open(controller);
    info!(
        session_id = %session_id,
        active_sessions = state.sessions.len(),
        "session created"
    );
    (
        StatusCode::CREATED,
        Json(SessionSnapshot::new(session_id, &snapshot)),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let controller = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    Ok(Json(SessionSnapshot::new(session_id, &controller.snapshot())))
}

/// POST /api/v1/sessions/:id/analyze
///
/// Runs one analysis cycle for the session. A second call while one is still
/// running is rejected with 409; the running one is unaffected.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let controller = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    let credential = resolve_credential(state.settings.as_ref(), &state.config).await?;
    controller.submit(&request, &credential).await?;

    Ok(Json(SessionSnapshot::new(session_id, &controller.snapshot())))
}

/// DELETE /api/v1/sessions/:id
///
/// Abandons the session. A response still in flight will be discarded.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.close(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {session_id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// One-shot upload
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Multipart fields: `file` (PDF, TXT or MD résumé), `jobDescription`, and
/// optionally `schema` (`screening` | `coaching`). Extracts the résumé text,
/// analyzes it, and stores the outcome as a candidate record.
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CandidateRecord>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut job_description = String::new();
    let mut schema = PromptSchema::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("jobDescription") => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid jobDescription: {e}")))?;
            }
            Some("schema") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid schema: {e}")))?;
                schema = parse_schema(&text)?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;

    let resume_text = {
        let file_name = file_name.clone();
        extract_off_thread(move || extract_text(&file_name, &bytes)).await?
    };

    let credential = resolve_credential(state.settings.as_ref(), &state.config).await?;
    let request = AnalysisRequest::new(resume_text, job_description).with_schema(schema);
    let result = state.new_controller().submit(&request, &credential).await?;

    let record = CandidateRecord::from_analysis(
        &file_name,
        request.resume_text,
        request.job_description,
        &result,
    );
    state.candidates.insert(&record).await?;

    Ok(Json(record))
}

/// Runs text extraction on the blocking pool. The PDF parser can panic on
/// corrupt input; that is reported as an extraction failure like any other.
async fn extract_off_thread<F>(extract: F) -> Result<String, AppError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    match tokio::task::spawn_blocking(extract).await {
        Ok(extracted) => Ok(extracted.map_err(AnalysisError::from)?),
        Err(e) if e.is_panic() => {
            warn!("document parser panicked during text extraction");
            Err(AnalysisError::ExtractionFailed(
                "the document is corrupt or unreadable".to_string(),
            )
            .into())
        }
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

fn parse_schema(raw: &str) -> Result<PromptSchema, AppError> {
    match raw.trim() {
        "" | "screening" => Ok(PromptSchema::Screening),
        "coaching" => Ok(PromptSchema::Coaching),
        other => Err(AppError::Validation(format!(
            "schema must be 'screening' or 'coaching', got '{other}'"
        ))),
    }
}
