use common::domain::{DomainError, DomainResult, Settings, SettingsRepository, UpdateSettingsInput};
use common::validation::validate_struct;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Owns the settings record for the life of the process.
///
/// The record is read once at startup and then served from memory; updates
/// are written through to storage before the cached copy is replaced.
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    current: RwLock<Settings>,
}

impl SettingsService {
    /// Load the stored settings, inserting `defaults` on first start
    pub async fn load(
        repository: Arc<dyn SettingsRepository>,
        defaults: Settings,
    ) -> DomainResult<Self> {
        let settings = repository.ensure_settings(defaults).await?;
        info!(
            co2_threshold = settings.co2_threshold,
            break_interval = settings.break_interval,
            mute_alerts = settings.mute_alerts,
            version = settings.version,
            "settings loaded"
        );

        Ok(Self {
            repository,
            current: RwLock::new(settings),
        })
    }

    pub async fn current(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Validate and persist a partial update, returning the merged record
    pub async fn update(&self, input: UpdateSettingsInput) -> DomainResult<Settings> {
        if input.is_empty() {
            return Err(DomainError::ValidationError(
                "expected at least one of co2Threshold, breakInterval, muteAlerts".to_string(),
            ));
        }
        validate_struct(&input)?;

        let updated = self.repository.update_settings(input).await?;

        let mut current = self.current.write().await;
        // Two racing writers may finish out of order; keep the newer record
        if updated.version >= current.version {
            *current = updated.clone();
        }
        debug!(version = updated.version, "settings cache refreshed");

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::MockSettingsRepository;

    async fn service_with(repository: MockSettingsRepository) -> SettingsService {
        SettingsService::load(Arc::new(repository), Settings::default())
            .await
            .unwrap()
    }

    fn repository_returning_defaults() -> MockSettingsRepository {
        let mut repository = MockSettingsRepository::new();
        repository
            .expect_ensure_settings()
            .times(1)
            .returning(Ok);
        repository
    }

    #[tokio::test]
    async fn test_load_keeps_stored_values() {
        let mut repository = MockSettingsRepository::new();
        repository.expect_ensure_settings().times(1).returning(|_| {
            Ok(Settings {
                co2_threshold: 1000.0,
                version: 4,
                ..Settings::default()
            })
        });

        let service = service_with(repository).await;
        let current = service.current().await;
        assert_eq!(current.co2_threshold, 1000.0);
        assert_eq!(current.version, 4);
    }

    #[tokio::test]
    async fn test_update_writes_through_and_refreshes_cache() {
        let mut repository = repository_returning_defaults();
        repository
            .expect_update_settings()
            .withf(|input: &UpdateSettingsInput| input.mute_alerts == Some(true))
            .times(1)
            .returning(|input| Ok(Settings::default().merged(&input)));

        let service = service_with(repository).await;
        let updated = service
            .update(UpdateSettingsInput {
                mute_alerts: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(updated.mute_alerts);
        assert_eq!(updated.version, 2);
        assert_eq!(service.current().await, updated);
    }

    #[tokio::test]
    async fn test_invalid_update_never_reaches_storage() {
        let mut repository = repository_returning_defaults();
        repository.expect_update_settings().never();

        let service = service_with(repository).await;
        let result = service
            .update(UpdateSettingsInput {
                co2_threshold: Some(-5.0),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
        assert_eq!(service.current().await.co2_threshold, 800.0);
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let mut repository = repository_returning_defaults();
        repository.expect_update_settings().never();

        let service = service_with(repository).await;
        let result = service.update(UpdateSettingsInput::default()).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_cache_untouched() {
        let mut repository = repository_returning_defaults();
        repository
            .expect_update_settings()
            .times(1)
            .returning(|_| Err(DomainError::RepositoryError(anyhow::anyhow!("connection reset"))));

        let service = service_with(repository).await;
        let result = service
            .update(UpdateSettingsInput {
                co2_threshold: Some(900.0),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(DomainError::RepositoryError(_))));
        assert_eq!(service.current().await.version, 1);
    }
}
