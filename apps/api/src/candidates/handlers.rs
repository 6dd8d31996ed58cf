use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::state::AppState;

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    let candidates = state.candidates.list().await?;
    Ok(Json(candidates))
}
