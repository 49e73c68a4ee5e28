use crate::domain::AnalyticsSummary;
use chrono::{DateTime, TimeDelta, Utc};
use common::domain::{DomainResult, EventKind, EventRepository, ListEventsSinceInput};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ANALYTICS_WINDOW: Duration = Duration::from_secs(600);

/// Service behind the analytics endpoint
pub struct AnalyticsService {
    event_repository: Arc<dyn EventRepository>,
    window: TimeDelta,
}

impl AnalyticsService {
    pub fn new(event_repository: Arc<dyn EventRepository>, window: Duration) -> Self {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::minutes(10));
        Self {
            event_repository,
            window,
        }
    }

    pub async fn summary(&self) -> DomainResult<AnalyticsSummary> {
        self.summary_at(Utc::now()).await
    }

    /// Summarise desk events in `[now - window, now]`
    pub async fn summary_at(&self, now: DateTime<Utc>) -> DomainResult<AnalyticsSummary> {
        let since = now - self.window;
        let events = self
            .event_repository
            .list_events_since(ListEventsSinceInput {
                kind: EventKind::Desk,
                since,
            })
            .await?;

        debug!(events = events.len(), since = %since, "computing analytics summary");
        Ok(AnalyticsSummary::from_events(&events))
    }
}
