use crate::domain::result::{DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device id used when a report does not name its sender
pub const DEFAULT_DEVICE_ID: &str = "desk-001";

/// Category tag of a stored event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Desk,
    Door,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Desk => "desk",
            EventKind::Door => "door",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desk" => Ok(EventKind::Desk),
            "door" => Ok(EventKind::Door),
            other => Err(DomainError::ValidationError(format!(
                "unknown event type '{}'",
                other
            ))),
        }
    }
}

/// Posture classification reported by the seat sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    #[default]
    Ok,
    Bad,
}

impl Posture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Posture::Ok => "ok",
            Posture::Bad => "bad",
        }
    }
}

impl FromStr for Posture {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Posture::Ok),
            "bad" => Ok(Posture::Bad),
            other => Err(DomainError::ValidationError(format!(
                "posture must be \"ok\" or \"bad\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Measurements carried by one event.
///
/// Every field is optional because door and desk units report different
/// subsets. Unrecognised measurements are kept in `extra` so nothing a sensor
/// sends is silently dropped from storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture: Option<Posture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seated_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SensorReading {
    pub fn is_occupied(&self) -> bool {
        self.presence.unwrap_or(false)
    }

    pub fn posture_or_default(&self) -> Posture {
        self.posture.unwrap_or_default()
    }

    pub fn is_exit(&self) -> bool {
        self.exit.unwrap_or(false)
    }
}

/// A stored, immutable sensor observation
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub id: i64,
    pub device_id: String,
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub reading: SensorReading,
}

/// Input for appending an event (id and received_at are assigned by storage)
#[derive(Debug, Clone, PartialEq)]
pub struct AppendEventInput {
    pub device_id: String,
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
    pub reading: SensorReading,
}

/// Input for reading the newest events of a kind, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRecentEventsInput {
    pub kind: EventKind,
    pub limit: i64,
}

/// Input for reading every event of a kind at or after `since`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventsSinceInput {
    pub kind: EventKind,
    pub since: DateTime<Utc>,
}

/// Repository trait for the append-only event store
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append one event and return it as stored
    async fn append_event(&self, input: AppendEventInput) -> DomainResult<SensorEvent>;

    /// Newest `limit` events ordered by timestamp descending
    async fn list_recent_events(&self, input: ListRecentEventsInput)
        -> DomainResult<Vec<SensorEvent>>;

    /// Events with `occurred_at >= since`, in ascending timestamp order
    async fn list_events_since(&self, input: ListEventsSinceInput)
        -> DomainResult<Vec<SensorEvent>>;
}
