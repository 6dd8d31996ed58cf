use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `settings` key/value table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettingRow {
    pub config_key: String,
    pub config_value: String,
}
