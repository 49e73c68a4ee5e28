use chrono::{DateTime, Utc};
use common::domain::{
    AppendEventInput, DomainError, DomainResult, EventKind, EventRepository, Posture,
    SensorEvent, SensorReading, DEFAULT_DEVICE_ID,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Measurements every desk report must carry as JSON numbers
const REQUIRED_NUMBERS: [&str; 4] = ["seatedSecs", "breakSecs", "temperature", "co2"];

/// Report keys that become event metadata rather than payload
const METADATA_KEYS: [&str; 3] = ["timestamp", "deviceId", "type"];

const KNOWN_KEYS: [&str; 3] = ["presence", "posture", "exit"];

/// Service for turning sensor reports into stored desk events
pub struct IngestionService {
    event_repository: Arc<dyn EventRepository>,
}

impl IngestionService {
    pub fn new(event_repository: Arc<dyn EventRepository>) -> Self {
        Self { event_repository }
    }

    /// Validate one report and append it as a `desk` event
    pub async fn ingest_report(&self, body: Value) -> DomainResult<SensorEvent> {
        let input = parse_report(&body, Utc::now())?;
        debug!(device_id = %input.device_id, occurred_at = %input.occurred_at, "ingesting report");

        let event = self.event_repository.append_event(input).await?;

        info!(event_id = event.id, device_id = %event.device_id, "report stored");
        Ok(event)
    }
}

/// Parse a report body. `received_at` stands in for a missing timestamp.
pub fn parse_report(body: &Value, received_at: DateTime<Utc>) -> DomainResult<AppendEventInput> {
    let fields = body.as_object().ok_or_else(|| {
        DomainError::ValidationError("report must be a JSON object".to_string())
    })?;

    let invalid: Vec<&str> = REQUIRED_NUMBERS
        .iter()
        .copied()
        .filter(|key| !fields.get(*key).is_some_and(Value::is_number))
        .collect();
    if !invalid.is_empty() {
        return Err(DomainError::ValidationError(format!(
            "{} must be numbers",
            invalid.join(", ")
        )));
    }

    let occurred_at = match fields.get("timestamp") {
        None | Some(Value::Null) => received_at,
        Some(value) => parse_timestamp(value)?,
    };

    let device_id = match fields.get("deviceId") {
        None | Some(Value::Null) => DEFAULT_DEVICE_ID.to_string(),
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(_) => {
            return Err(DomainError::ValidationError(
                "deviceId must be a non-empty string".to_string(),
            ))
        }
    };

    let reading = SensorReading {
        presence: optional_bool(fields, "presence")?,
        posture: optional_posture(fields)?,
        co2: number(fields, "co2"),
        temperature: number(fields, "temperature"),
        seated_secs: number(fields, "seatedSecs"),
        break_secs: number(fields, "breakSecs"),
        exit: optional_bool(fields, "exit")?,
        extra: extra_measurements(fields),
    };

    Ok(AppendEventInput {
        device_id,
        kind: EventKind::Desk,
        occurred_at,
        reading,
    })
}

/// Epoch milliseconds or an RFC 3339 string
fn parse_timestamp(value: &Value) -> DomainResult<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|ms| DateTime::from_timestamp_millis(ms.round() as i64)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    };

    parsed.ok_or_else(|| {
        DomainError::ValidationError(format!(
            "timestamp must be epoch milliseconds or an RFC 3339 string, got {}",
            value
        ))
    })
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

fn optional_bool(fields: &Map<String, Value>, key: &str) -> DomainResult<Option<bool>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(DomainError::ValidationError(format!(
            "{} must be a boolean",
            key
        ))),
    }
}

fn optional_posture(fields: &Map<String, Value>) -> DomainResult<Option<Posture>> {
    match fields.get("posture") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(_) => Err(DomainError::ValidationError(
            "posture must be \"ok\" or \"bad\"".to_string(),
        )),
    }
}

/// Numeric and boolean fields the backend has no name for yet
fn extra_measurements(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .filter(|(key, _)| {
            let key = key.as_str();
            !REQUIRED_NUMBERS.contains(&key)
                && !METADATA_KEYS.contains(&key)
                && !KNOWN_KEYS.contains(&key)
        })
        .filter(|(_, value)| value.is_number() || value.is_boolean())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
