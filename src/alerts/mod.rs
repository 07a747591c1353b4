//! Alert delivery. The engine decides when and what; an [`Alerter`]
//! decides how.

mod webhook;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

use crate::config::AlertsConfig;

pub use webhook::WebhookAlerter;

/// Subject of every alert raised on a fatal path.
pub const CRITICAL_ALERT_SUBJECT: &str = "CRITICAL Alert message from BX-bot";

/// Delivers an alert somewhere a human will see it.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn send_alert(&self, subject: &str, body: &str) -> Result<()>;
}

/// Writes alerts to the log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    async fn send_alert(&self, subject: &str, body: &str) -> Result<()> {
        error!(subject = %subject, "{}", body);
        Ok(())
    }
}

/// Pick the alerter for a configuration: webhook when enabled with a URL,
/// the log otherwise.
pub fn from_config(config: &AlertsConfig, bot_id: &str) -> Result<Arc<dyn Alerter>> {
    match (&config.webhook_url, config.enabled) {
        (Some(url), true) => Ok(Arc::new(WebhookAlerter::new(url.clone(), bot_id)?)),
        _ => Ok(Arc::new(LogAlerter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_alerter_never_fails() {
        assert!(LogAlerter.send_alert(CRITICAL_ALERT_SUBJECT, "body").await.is_ok());
    }

    #[test]
    fn test_disabled_config_uses_log() {
        let config = AlertsConfig {
            enabled: false,
            webhook_url: Some("http://localhost:9/alerts".to_string()),
        };
        assert!(from_config(&config, "bot-1").is_ok());
    }

    #[test]
    fn test_enabled_config_builds_webhook() {
        let config = AlertsConfig {
            enabled: true,
            webhook_url: Some("http://localhost:9/alerts".to_string()),
        };
        assert!(from_config(&config, "bot-1").is_ok());
    }
}
