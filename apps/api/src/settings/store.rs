//! Settings store: where the active provider and its key live.
//!
//! Stored as key/value rows: `ai.provider` holds the provider id and
//! `<provider>.key` holds that provider's key, so switching providers keeps
//! the other keys around.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::llm_client::ProviderId;
use crate::models::setting::SettingRow;

pub const PROVIDER_KEY: &str = "ai.provider";

fn api_key_key(provider: ProviderId) -> String {
    format!("{}.key", provider.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub provider: ProviderId,
    pub api_key: String,
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The active provider and its key, if one has been saved.
    async fn get_settings(&self) -> Result<Option<ProviderSettings>>;

    async fn save_settings(&self, settings: &ProviderSettings) -> Result<()>;
}

/// Reads the active provider settings out of a key/value map.
fn settings_from_map(values: &HashMap<String, String>) -> Option<ProviderSettings> {
    let raw_provider = values.get(PROVIDER_KEY)?;
    let provider = match raw_provider.parse::<ProviderId>() {
        Ok(p) => p,
        Err(e) => {
            warn!("ignoring stored provider setting: {e}");
            return None;
        }
    };
    let api_key = values.get(&api_key_key(provider))?.trim().to_string();
    if api_key.is_empty() {
        return None;
    }
    Some(ProviderSettings { provider, api_key })
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get_settings(&self) -> Result<Option<ProviderSettings>> {
        let rows = sqlx::query_as::<_, SettingRow>("SELECT config_key, config_value FROM settings")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load settings")?;

        let values: HashMap<String, String> = rows
            .into_iter()
            .map(|row| (row.config_key, row.config_value))
            .collect();
        Ok(settings_from_map(&values))
    }

    async fn save_settings(&self, settings: &ProviderSettings) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in [
            (PROVIDER_KEY.to_string(), settings.provider.as_str().to_string()),
            (api_key_key(settings.provider), settings.api_key.clone()),
        ] {
            sqlx::query(
                r#"
                INSERT INTO settings (config_key, config_value)
                VALUES ($1, $2)
                ON CONFLICT (config_key) DO UPDATE SET config_value = EXCLUDED.config_value
                "#,
            )
            .bind(&key)
            .bind(&value)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save setting '{key}'"))?;
        }

        tx.commit().await?;
        info!(provider = %settings.provider, "provider settings saved");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory (no DATABASE_URL, and tests)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_settings(&self) -> Result<Option<ProviderSettings>> {
        Ok(settings_from_map(&*self.values.read().await))
    }

    async fn save_settings(&self, settings: &ProviderSettings) -> Result<()> {
        let mut values = self.values.write().await;
        values.insert(PROVIDER_KEY.to_string(), settings.provider.as_str().to_string());
        values.insert(api_key_key(settings.provider), settings.api_key.clone());
        Ok(())
    }
}
