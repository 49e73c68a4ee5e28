use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use common::domain::{Posture, SensorEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of recent desk events the dashboard looks at
pub const DEFAULT_TREND_LENGTH: i64 = 6;

/// Current state of the desk, derived from the most recent events.
///
/// Trend and timeline keep the order they were read in: newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub device_id: String,
    pub desk_occupied: bool,
    pub co2: Option<f64>,
    pub room_temp: Option<f64>,
    pub posture: Posture,
    pub co2_trend: Vec<Option<f64>>,
    pub occ_timeline: Vec<u8>,
}

impl DashboardSnapshot {
    /// Build a snapshot from events ordered newest first.
    ///
    /// Returns `None` when there is nothing to summarise.
    pub fn from_recent(recent: &[SensorEvent]) -> Option<Self> {
        let latest = recent.first()?;

        Some(Self {
            device_id: latest.device_id.clone(),
            desk_occupied: latest.reading.is_occupied(),
            co2: latest.reading.co2,
            room_temp: latest.reading.temperature,
            posture: latest.reading.posture_or_default(),
            co2_trend: recent.iter().map(|event| event.reading.co2).collect(),
            occ_timeline: recent
                .iter()
                .map(|event| u8::from(event.reading.is_occupied()))
                .collect(),
        })
    }
}

/// Break seconds summed per wall-clock minute
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakChart {
    pub labels: Vec<String>,
    pub break_durations: Vec<f64>,
}

/// Scalars and chart for the analytics page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_exits: u64,
    pub avg_break: i64,
    pub posture_ok: i64,
    #[serde(rename = "avgCO2")]
    pub avg_co2: i64,
    pub chart: BreakChart,
}

impl AnalyticsSummary {
    /// Summarise the events of one analytics window. Order of `events` does
    /// not matter; buckets always come out oldest minute first.
    pub fn from_events(events: &[SensorEvent]) -> Self {
        let mut total_exits = 0u64;
        let mut break_total = 0.0;
        let mut co2_total = 0.0;
        let mut posture_ok = 0usize;
        let mut buckets: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

        for event in events {
            let reading = &event.reading;
            let break_secs = reading.break_secs.unwrap_or(0.0);

            if reading.is_exit() {
                total_exits += 1;
            }
            if reading.posture_or_default() == Posture::Ok {
                posture_ok += 1;
            }
            break_total += break_secs;
            co2_total += reading.co2.unwrap_or(0.0);

            *buckets.entry(minute_of(event.occurred_at)).or_insert(0.0) += break_secs;
        }

        let count = events.len();
        let (labels, break_durations) = buckets
            .into_iter()
            .map(|(minute, secs)| (minute.format("%H:%M").to_string(), secs))
            .unzip();

        Self {
            total_exits,
            avg_break: rounded_mean(break_total, count),
            posture_ok: rounded_mean(posture_ok as f64 * 100.0, count),
            avg_co2: rounded_mean(co2_total, count),
            chart: BreakChart {
                labels,
                break_durations,
            },
        }
    }
}

/// Mean rounded half away from zero; 0 for an empty set
pub fn rounded_mean(total: f64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (total / count as f64).round() as i64
}

fn minute_of(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(TimeDelta::minutes(1))
        .unwrap_or(timestamp)
}
