use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Outdoor weather shown next to the indoor readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutdoorConditions {
    pub temperature: f64,
    pub aqi: u32,
}

/// Source of outdoor conditions. The deployed source is simulated; a real
/// weather integration implements this trait without touching aggregation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OutdoorConditionsSource: Send + Sync {
    async fn current(&self) -> DomainResult<OutdoorConditions>;
}
