use crate::domain::{AlertDispatcher, DashboardSnapshot, SettingsService};
use common::domain::{
    DomainError, DomainResult, EventKind, EventRepository, ListRecentEventsInput,
    OutdoorConditionsSource, Posture,
};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, warn};

/// Dashboard payload as the browser renders it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub desk_occupied: bool,
    #[serde(serialize_with = "reading")]
    pub co2: Option<f64>,
    #[serde(serialize_with = "reading")]
    pub room_temp: Option<f64>,
    /// No light sensor on the kit yet
    pub light_on: bool,
    #[serde(serialize_with = "reading")]
    pub outdoor_temp: Option<f64>,
    pub outdoor_aqi: Option<u32>,
    pub posture: Posture,
    #[serde(serialize_with = "readings")]
    pub co2_trend: Vec<Option<f64>>,
    pub occ_timeline: Vec<u8>,
}

/// A sensor value written the way the sensor sent it: `850`, not `850.0`
struct Reading(Option<f64>);

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Integers beyond 2^53 are not exact in an f64
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        match self.0 {
            None => serializer.serialize_none(),
            Some(value) if value.fract() == 0.0 && value.abs() < MAX_EXACT => {
                serializer.serialize_i64(value as i64)
            }
            Some(value) => serializer.serialize_f64(value),
        }
    }
}

fn reading<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    Reading(*value).serialize(serializer)
}

fn readings<S: Serializer>(values: &[Option<f64>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|value| Reading(*value)))
}

/// Service behind the dashboard endpoint. Every snapshot served is also
/// handed to the alert dispatcher.
pub struct DashboardService {
    event_repository: Arc<dyn EventRepository>,
    settings: Arc<SettingsService>,
    outdoor: Arc<dyn OutdoorConditionsSource>,
    alerts: Arc<AlertDispatcher>,
    trend_length: i64,
}

impl DashboardService {
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        settings: Arc<SettingsService>,
        outdoor: Arc<dyn OutdoorConditionsSource>,
        alerts: Arc<AlertDispatcher>,
        trend_length: i64,
    ) -> Self {
        Self {
            event_repository,
            settings,
            outdoor,
            alerts,
            trend_length,
        }
    }

    /// Read the latest desk events, evaluate alerts and build the view
    pub async fn dashboard(&self) -> DomainResult<DashboardView> {
        let recent = self
            .event_repository
            .list_recent_events(ListRecentEventsInput {
                kind: EventKind::Desk,
                limit: self.trend_length,
            })
            .await?;

        let snapshot = DashboardSnapshot::from_recent(&recent)
            .ok_or_else(|| DomainError::NoData("No data yet".to_string()))?;
        debug!(
            events = recent.len(),
            co2 = ?snapshot.co2,
            occupied = snapshot.desk_occupied,
            "computed dashboard snapshot"
        );

        let settings = self.settings.current().await;
        // Alerts go out in the background; the response does not wait
        let _ = self.alerts.on_snapshot(&snapshot, &settings);

        let outdoor = match self.outdoor.current().await {
            Ok(conditions) => Some(conditions),
            Err(e) => {
                warn!(error = %e, "outdoor conditions unavailable");
                None
            }
        };

        Ok(DashboardView {
            desk_occupied: snapshot.desk_occupied,
            co2: snapshot.co2,
            room_temp: snapshot.room_temp,
            light_on: true,
            outdoor_temp: outdoor.map(|o| o.temperature),
            outdoor_aqi: outdoor.map(|o| o.aqi),
            posture: snapshot.posture,
            co2_trend: snapshot.co2_trend,
            occ_timeline: snapshot.occ_timeline,
        })
    }
}
