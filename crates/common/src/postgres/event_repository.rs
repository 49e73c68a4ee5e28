use crate::domain::{
    AppendEventInput, DomainError, DomainResult, EventKind, EventRepository,
    ListEventsSinceInput, ListRecentEventsInput, SensorEvent, SensorReading,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// Sensor event row as stored in PostgreSQL
#[derive(Debug, Clone)]
pub struct SensorEventRow {
    pub id: i64,
    pub device_id: String,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl SensorEventRow {
    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            device_id: row.get(1),
            event_type: row.get(2),
            occurred_at: row.get(3),
            received_at: row.get(4),
            payload: row.get(5),
        }
    }
}

impl TryFrom<SensorEventRow> for SensorEvent {
    type Error = DomainError;

    fn try_from(row: SensorEventRow) -> Result<Self, Self::Error> {
        let kind: EventKind = row.event_type.parse().map_err(|_| {
            DomainError::RepositoryError(anyhow::anyhow!(
                "event {} has unknown type '{}'",
                row.id,
                row.event_type
            ))
        })?;
        let reading: SensorReading = serde_json::from_value(row.payload).map_err(|e| {
            DomainError::RepositoryError(anyhow::anyhow!(
                "event {} has unreadable payload: {}",
                row.id,
                e
            ))
        })?;

        Ok(SensorEvent {
            id: row.id,
            device_id: row.device_id,
            kind,
            occurred_at: row.occurred_at,
            received_at: row.received_at,
            reading,
        })
    }
}

fn rows_to_events(rows: &[Row]) -> DomainResult<Vec<SensorEvent>> {
    rows.iter()
        .map(|row| SensorEvent::try_from(SensorEventRow::from_row(row)))
        .collect()
}

/// PostgreSQL implementation of EventRepository trait
#[derive(Clone)]
pub struct PostgresEventRepository {
    client: PostgresClient,
}

impl PostgresEventRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    #[instrument(skip(self, input), fields(device_id = %input.device_id, kind = %input.kind))]
    async fn append_event(&self, input: AppendEventInput) -> DomainResult<SensorEvent> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let payload = serde_json::to_value(&input.reading)
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let row = conn
            .query_one(
                "INSERT INTO sensor_events (device_id, event_type, occurred_at, received_at, payload)
                 VALUES ($1, $2, $3, NOW(), $4)
                 RETURNING id, received_at",
                &[
                    &input.device_id,
                    &input.kind.as_str(),
                    &input.occurred_at,
                    &payload,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let id: i64 = row.get(0);
        debug!("appended event: {}", id);

        Ok(SensorEvent {
            id,
            device_id: input.device_id,
            kind: input.kind,
            occurred_at: input.occurred_at,
            received_at: row.get(1),
            reading: input.reading,
        })
    }

    #[instrument(skip(self, input), fields(kind = %input.kind, limit = input.limit))]
    async fn list_recent_events(
        &self,
        input: ListRecentEventsInput,
    ) -> DomainResult<Vec<SensorEvent>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT id, device_id, event_type, occurred_at, received_at, payload
                 FROM sensor_events
                 WHERE event_type = $1
                 ORDER BY occurred_at DESC, id DESC
                 LIMIT $2",
                &[&input.kind.as_str(), &input.limit],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!("found {} recent {} events", rows.len(), input.kind);
        rows_to_events(&rows)
    }

    #[instrument(skip(self, input), fields(kind = %input.kind, since = %input.since))]
    async fn list_events_since(
        &self,
        input: ListEventsSinceInput,
    ) -> DomainResult<Vec<SensorEvent>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT id, device_id, event_type, occurred_at, received_at, payload
                 FROM sensor_events
                 WHERE event_type = $1 AND occurred_at >= $2
                 ORDER BY occurred_at ASC, id ASC",
                &[&input.kind.as_str(), &input.since],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!("found {} {} events since {}", rows.len(), input.kind, input.since);
        rows_to_events(&rows)
    }
}
