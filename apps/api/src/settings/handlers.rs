//! Axum route handlers for the Settings API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::ProviderId;
use crate::settings::classifier::ProviderCredential;
use crate::settings::store::ProviderSettings;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub provider: Option<ProviderId>,
    /// Masked key, never the key itself.
    pub key_preview: Option<String>,
    /// "saved", "environment" or "none".
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub recognized: bool,
    pub provider: Option<ProviderId>,
    pub display_name: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SaveSettingsResponse {
    pub provider: ProviderId,
    pub message: String,
}

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    if let Some(saved) = state.settings.get_settings().await? {
        return Ok(Json(SettingsResponse {
            provider: Some(saved.provider),
            key_preview: Some(mask_key(&saved.api_key)),
            source: "saved",
        }));
    }

    let provider = state.config.ai_provider;
    let response = match state.config.env_api_key(provider) {
        Some(key) => SettingsResponse {
            provider: Some(provider),
            key_preview: Some(mask_key(key)),
            source: "environment",
        },
        None => SettingsResponse {
            provider: None,
            key_preview: None,
            source: "none",
        },
    };
    Ok(Json(response))
}

/// POST /api/v1/settings
///
/// Classifies the key and saves it as the active provider. Unrecognized keys are refused.
pub async fn handle_save_settings(
    State(state): State<AppState>,
    Json(request): Json<ApiKeyRequest>,
) -> Result<Json<SaveSettingsResponse>, AppError> {
    let credential = ProviderCredential::detect(&request.api_key);
    let Some(provider) = credential.provider else {
        return Err(AppError::Validation(
            "Invalid or unrecognized API key format.".to_string(),
        ));
    };

    state
        .settings
        .save_settings(&ProviderSettings {
            provider,
            api_key: credential.raw_key,
        })
        .await?;
    info!(provider = %provider, "active AI provider updated");

    Ok(Json(SaveSettingsResponse {
        provider,
        message: format!("Successfully activated {} engine!", provider.display_name()),
    }))
}

/// POST /api/v1/settings/detect
pub async fn handle_detect_provider(Json(request): Json<ApiKeyRequest>) -> Json<DetectResponse> {
    let credential = ProviderCredential::detect(&request.api_key);
    Json(DetectResponse {
        recognized: credential.is_recognized(),
        provider: credential.provider,
        display_name: credential.provider.map(|p| p.display_name()),
    })
}

/// Shows the first and last four characters of long keys, nothing of short ones.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
