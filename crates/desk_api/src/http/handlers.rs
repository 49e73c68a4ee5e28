use crate::domain::{
    AnalyticsService, AnalyticsSummary, DashboardService, DashboardView, IngestionService,
    SettingsService,
};
use crate::http::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use common::domain::{DomainError, Settings, UpdateSettingsInput};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Services shared by every handler
#[derive(Clone)]
pub struct DeskApiServices {
    pub ingestion: Arc<IngestionService>,
    pub dashboard: Arc<DashboardService>,
    pub analytics: Arc<AnalyticsService>,
    pub settings: Arc<SettingsService>,
}

/// Settings as sent to the settings page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub co2_threshold: f64,
    pub break_interval: f64,
    pub mute_alerts: bool,
    pub version: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Settings> for SettingsResponse {
    fn from(settings: Settings) -> Self {
        Self {
            co2_threshold: settings.co2_threshold,
            break_interval: settings.break_interval,
            mute_alerts: settings.mute_alerts,
            version: settings.version,
            updated_at: settings.updated_at,
        }
    }
}

#[instrument(name = "IngestReport", skip(services, payload))]
pub async fn report_handler(
    State(services): State<DeskApiServices>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    services.ingestion.ingest_report(body).await?;

    Ok(Json(json!({ "success": true })))
}

#[instrument(name = "GetDashboard", skip(services))]
pub async fn dashboard_handler(
    State(services): State<DeskApiServices>,
) -> Result<Json<DashboardView>, ApiError> {
    let view = services.dashboard.dashboard().await?;
    Ok(Json(view))
}

#[instrument(name = "GetAnalytics", skip(services))]
pub async fn analytics_handler(
    State(services): State<DeskApiServices>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let summary = services.analytics.summary().await?;
    Ok(Json(summary))
}

#[instrument(name = "GetSettings", skip(services))]
pub async fn get_settings_handler(
    State(services): State<DeskApiServices>,
) -> Json<SettingsResponse> {
    Json(services.settings.current().await.into())
}

#[instrument(name = "UpdateSettings", skip(services, payload))]
pub async fn update_settings_handler(
    State(services): State<DeskApiServices>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let Json(body) = payload?;

    // Decode by hand so a mistyped field is a 400 naming the field
    let input: UpdateSettingsInput = serde_json::from_value(body)
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
    debug!(?input, "updating settings");

    let settings = services.settings.update(input).await?;
    Ok(Json(settings.into()))
}
