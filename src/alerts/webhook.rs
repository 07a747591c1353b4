//! Webhook alerter: POSTs alerts as JSON, retrying with exponential backoff.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::Alerter;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    subject: &'a str,
    body: &'a str,
    bot_id: &'a str,
    sent_at: DateTime<Utc>,
}

pub struct WebhookAlerter {
    client: Client,
    url: String,
    bot_id: String,
}

impl WebhookAlerter {
    pub fn new(url: impl Into<String>, bot_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            bot_id: bot_id.into(),
        })
    }

    fn retry_policy() -> ExponentialBackoff {
        ExponentialBackoff {
            max_elapsed_time: Some(MAX_RETRY_ELAPSED),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Alerter for WebhookAlerter {
    async fn send_alert(&self, subject: &str, body: &str) -> Result<()> {
        let payload = AlertPayload {
            subject,
            body,
            bot_id: &self.bot_id,
            sent_at: Utc::now(),
        };

        backoff::future::retry(Self::retry_policy(), || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    warn!(error = %e, "Alert webhook unreachable, retrying");
                    backoff::Error::transient(anyhow::Error::from(e))
                })?;

            let status = response.status();
            if status.is_server_error() {
                warn!(status = %status, "Alert webhook server error, retrying");
                return Err(backoff::Error::transient(anyhow::anyhow!(
                    "Alert webhook returned {}",
                    status
                )));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(anyhow::anyhow!(
                    "Alert webhook rejected alert: {}",
                    status
                )));
            }
            Ok(())
        })
        .await
        .with_context(|| format!("Failed to deliver alert to {}", self.url))?;

        info!(url = %self.url, "Alert delivered");
        Ok(())
    }
}
