// Provider settings: key classification, storage, and credential resolution.

pub mod classifier;
pub mod handlers;
pub mod store;

use tracing::debug;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::Credential;
use crate::settings::store::SettingsStore;

/// Resolves the credential for the next analysis.
///
/// Saved settings win over the environment defaults. The core never reads
/// credentials from anywhere else.
pub async fn resolve_credential(
    store: &dyn SettingsStore,
    config: &Config,
) -> Result<Credential, AppError> {
    if let Some(saved) = store.get_settings().await? {
        debug!(provider = %saved.provider, "using saved provider settings");
        return Ok(config.credential(saved.provider, saved.api_key));
    }

    let provider = config.ai_provider;
    let api_key = config
        .env_api_key(provider)
        .ok_or(AppError::NotConfigured)?;
    debug!(provider = %provider, "using provider key from environment");
    Ok(config.credential(provider, api_key))
}
