use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::Deserialize;

/// Fixed key of the singleton settings record
pub const SETTINGS_ID: &str = "global";

pub const DEFAULT_CO2_THRESHOLD: f64 = 800.0;
pub const DEFAULT_BREAK_INTERVAL: f64 = 45.0;

/// Global dashboard settings.
///
/// `version` starts at 1 and is bumped by every update, so callers holding a
/// copy can tell whether it is stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub co2_threshold: f64,
    pub break_interval: f64,
    pub mute_alerts: bool,
    pub version: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            co2_threshold: DEFAULT_CO2_THRESHOLD,
            break_interval: DEFAULT_BREAK_INTERVAL,
            mute_alerts: false,
            version: 1,
            updated_at: None,
        }
    }
}

impl Settings {
    /// Defaults with deployment-specific threshold and break interval
    pub fn with_defaults(co2_threshold: f64, break_interval: f64) -> Self {
        Self {
            co2_threshold,
            break_interval,
            ..Self::default()
        }
    }

    /// Apply a partial update; absent fields keep their current value
    pub fn merged(&self, update: &UpdateSettingsInput) -> Self {
        Self {
            co2_threshold: update.co2_threshold.unwrap_or(self.co2_threshold),
            break_interval: update.break_interval.unwrap_or(self.break_interval),
            mute_alerts: update.mute_alerts.unwrap_or(self.mute_alerts),
            version: self.version + 1,
            updated_at: self.updated_at,
        }
    }
}

/// Partial settings update as submitted by the settings page
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    #[garde(range(min = 0.0))]
    pub co2_threshold: Option<f64>,
    #[garde(range(min = 1.0))]
    pub break_interval: Option<f64>,
    #[garde(skip)]
    pub mute_alerts: Option<bool>,
}

impl UpdateSettingsInput {
    pub fn is_empty(&self) -> bool {
        self.co2_threshold.is_none() && self.break_interval.is_none() && self.mute_alerts.is_none()
    }
}

/// Repository trait for the singleton settings record
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Insert `defaults` if no record exists yet, then return the stored record
    async fn ensure_settings(&self, defaults: Settings) -> DomainResult<Settings>;

    /// Merge `input` into the stored record and bump its version
    async fn update_settings(&self, input: UpdateSettingsInput) -> DomainResult<Settings>;
}
