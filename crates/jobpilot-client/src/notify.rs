use std::time::Duration;

use jobpilot_core::error::AppError;
use jobpilot_core::traits::Notifier;
use reqwest::Client;
use serde::Serialize;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook notifier posting `{"title", "body"}` JSON.
///
/// Fire-and-forget: delivery failures are logged and swallowed, never
/// surfaced to the pipeline.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct NotifyPayload<'a> {
    title: &'a str,
    body: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str) {
        let payload = NotifyPayload { title, body };
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    "Webhook notification rejected"
                );
            }
            Ok(_) => tracing::debug!(title, "Notification delivered"),
            Err(e) => tracing::warn!(error = %e, "Webhook notification failed"),
        }
    }
}
