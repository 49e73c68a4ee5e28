use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid data format: {0}")]
    ValidationError(String),

    #[error("{0}")]
    NoData(String),

    #[error("Settings not found: {0}")]
    SettingsNotFound(String),

    #[error("Notification failed: {0}")]
    NotificationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
