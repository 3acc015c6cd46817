use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Batch,
    Continuous,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyConfig {
    pub weekday: String,
    pub hour: u32,
}

/// One configured bot instance: one token, one timezone, one data directory.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantConfig {
    pub name: String,
    /// Name of the environment variable holding the bot token.
    pub token_env: String,
    pub timezone: String,
    pub timetable: String,
    pub texts: String,
    pub chats: String,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_day_preview_offset")]
    pub day_preview_offset_minutes: i64,
    #[serde(default = "default_upcoming_offset")]
    pub upcoming_offset_minutes: i64,
    #[serde(default = "default_continuous_offset")]
    pub continuous_offset_minutes: i64,
    pub weekly: Option<WeeklyConfig>,
}

fn default_tick_secs() -> u64 {
    60
}

fn default_day_preview_offset() -> i64 {
    180
}

fn default_upcoming_offset() -> i64 {
    20
}

fn default_continuous_offset() -> i64 {
    15
}

pub fn load_tenants(path: &Path) -> Result<Vec<TenantConfig>, StoreError> {
    let json = fs::read_to_string(path)?;
    let tenants: Vec<TenantConfig> = serde_json::from_str(&json)?;
    if tenants.is_empty() {
        return Err(StoreError::Invalid("no tenants configured".into()));
    }
    Ok(tenants)
}
