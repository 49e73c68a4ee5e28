use async_trait::async_trait;
use common::domain::{DomainResult, OutdoorConditions, OutdoorConditionsSource};
use rand::Rng;

/// Stand-in outdoor source: random values in a plausible range.
///
/// The desk kit has no outdoor sensor and no weather feed is wired up, so
/// these numbers carry no information.
#[derive(Debug, Clone, Default)]
pub struct SimulatedOutdoorConditions;

impl SimulatedOutdoorConditions {
    pub fn new() -> Self {
        Self
    }

    /// Temperature in 10.0..=25.0 with one decimal, AQI in 20..=99
    pub fn sample<R: Rng>(rng: &mut R) -> OutdoorConditions {
        let temperature = (rng.random_range(10.0..=25.0_f64) * 10.0).round() / 10.0;
        OutdoorConditions {
            temperature,
            aqi: rng.random_range(20..100),
        }
    }
}

#[async_trait]
impl OutdoorConditionsSource for SimulatedOutdoorConditions {
    async fn current(&self) -> DomainResult<OutdoorConditions> {
        Ok(Self::sample(&mut rand::rng()))
    }
}
