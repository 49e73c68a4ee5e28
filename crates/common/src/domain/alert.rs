use crate::domain::result::DomainResult;
use async_trait::async_trait;
use std::fmt;

/// Kinds of alert, each with its own cooldown clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Co2,
    Posture,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Co2 => "co2",
            AlertKind::Posture => "posture",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decided alert, ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// Outbound channel for alerts (chat webhook in production)
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Deliver one alert. Callers never retry on error.
    async fn notify(&self, alert: &Alert) -> DomainResult<()>;
}
