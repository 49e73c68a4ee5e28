use crate::domain::{Alert, AlertNotifier, DomainError, DomainResult};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat webhook body. `content` is the field Discord-style webhooks render.
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Sends alerts as JSON POSTs to a chat webhook
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: reqwest::Url,
}

/// Parses a webhook address, accepting only absolute http(s) URLs
pub fn parse_webhook_url(url: &str) -> Result<reqwest::Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        bail!("webhook url is empty");
    }

    let parsed = reqwest::Url::parse(trimmed)
        .with_context(|| format!("invalid webhook url: {}", trimmed))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => bail!("webhook url must use http or https, got {}", other),
    }
}

impl WebhookNotifier {
    /// Creates a notifier whose requests give up after `timeout`.
    /// Fails up front when `url` is not an http(s) URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = parse_webhook_url(url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook http client")?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    #[instrument(skip(self, alert), fields(kind = %alert.kind))]
    async fn notify(&self, alert: &Alert) -> DomainResult<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&WebhookMessage {
                content: &alert.message,
            })
            .send()
            .await
            .map_err(|e| DomainError::NotificationError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::NotificationError(format!(
                "webhook responded with {}",
                status
            )));
        }

        debug!(status = %status, "webhook delivered");
        Ok(())
    }
}
