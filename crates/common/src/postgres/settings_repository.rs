use crate::domain::{
    DomainError, DomainResult, Settings, SettingsRepository, UpdateSettingsInput, SETTINGS_ID,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, info, instrument};

/// Settings row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct SettingsRow {
    pub co2_threshold: f64,
    pub break_interval: f64,
    pub mute_alerts: bool,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl SettingsRow {
    fn from_row(row: &Row) -> Self {
        Self {
            co2_threshold: row.get(0),
            break_interval: row.get(1),
            mute_alerts: row.get(2),
            version: row.get(3),
            updated_at: row.get(4),
        }
    }
}

impl From<SettingsRow> for Settings {
    fn from(row: SettingsRow) -> Self {
        Settings {
            co2_threshold: row.co2_threshold,
            break_interval: row.break_interval,
            mute_alerts: row.mute_alerts,
            version: row.version,
            updated_at: Some(row.updated_at),
        }
    }
}

/// PostgreSQL implementation of SettingsRepository trait
#[derive(Clone)]
pub struct PostgresSettingsRepository {
    client: PostgresClient,
}

impl PostgresSettingsRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    #[instrument(skip(self, defaults), fields(settings_id = SETTINGS_ID))]
    async fn ensure_settings(&self, defaults: Settings) -> DomainResult<Settings> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // Only the first startup writes; later ones keep whatever was saved
        let inserted = conn
            .execute(
                "INSERT INTO settings (id, co2_threshold, break_interval, mute_alerts, version, updated_at)
                 VALUES ($1, $2, $3, $4, $5, NOW())
                 ON CONFLICT (id) DO NOTHING",
                &[
                    &SETTINGS_ID,
                    &defaults.co2_threshold,
                    &defaults.break_interval,
                    &defaults.mute_alerts,
                    &defaults.version,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if inserted > 0 {
            info!(
                co2_threshold = defaults.co2_threshold,
                break_interval = defaults.break_interval,
                "created default settings"
            );
        }

        let row = conn
            .query_opt(
                "SELECT co2_threshold, break_interval, mute_alerts, version, updated_at
                 FROM settings
                 WHERE id = $1",
                &[&SETTINGS_ID],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?
            .ok_or_else(|| DomainError::SettingsNotFound(SETTINGS_ID.to_string()))?;

        Ok(SettingsRow::from_row(&row).into())
    }

    #[instrument(skip(self, input))]
    async fn update_settings(&self, input: UpdateSettingsInput) -> DomainResult<Settings> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "UPDATE settings
                 SET co2_threshold = COALESCE($2, co2_threshold),
                     break_interval = COALESCE($3, break_interval),
                     mute_alerts = COALESCE($4, mute_alerts),
                     version = version + 1,
                     updated_at = NOW()
                 WHERE id = $1
                 RETURNING co2_threshold, break_interval, mute_alerts, version, updated_at",
                &[
                    &SETTINGS_ID,
                    &input.co2_threshold,
                    &input.break_interval,
                    &input.mute_alerts,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?
            .ok_or_else(|| DomainError::SettingsNotFound(SETTINGS_ID.to_string()))?;

        let settings: Settings = SettingsRow::from_row(&row).into();
        debug!(version = settings.version, "updated settings");

        Ok(settings)
    }
}
