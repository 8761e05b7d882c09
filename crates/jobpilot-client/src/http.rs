use std::time::Duration;

use jobpilot_core::config::ProxyConfig;
use jobpilot_core::error::AppError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// HTTP client shared by all platform adapters.
///
/// Wraps reqwest with a browser-like User-Agent, an optional outbound
/// proxy, and bounded retry. Transport failures (timeout, connect,
/// reset) are retried up to three attempts with a linearly growing
/// backoff; HTTP error statuses are returned to the caller as data,
/// since a 4xx from a recruiting API usually means an invalid session
/// or a rejected action, not a transient fault.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

/// A completed HTTP exchange. Any status, body fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body, mapping failures to a parse error that
    /// includes a body prefix for diagnosis.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_str(&self.body).map_err(|e| {
            let prefix: String = self.body.chars().take(200).collect();
            AppError::ParseError(format!("HTTP {} body: {e}: {prefix}", self.status))
        })
    }
}

impl HttpClient {
    pub fn new(proxy: &ProxyConfig) -> Result<Self, AppError> {
        Self::with_timeout(proxy, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(proxy: &ProxyConfig, timeout: Duration) -> Result<Self, AppError> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .cookie_store(true);
        if proxy.enabled && !proxy.url.is_empty() {
            let proxy = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| AppError::Config(format!("invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request, retrying transport failures.
    ///
    /// The builder must be cloneable (no streaming body); requests that
    /// cannot be cloned get a single attempt.
    pub async fn send(&self, request: RequestBuilder) -> Result<HttpResponse, AppError> {
        let mut attempt = 1u32;
        loop {
            let this_try = match request.try_clone() {
                Some(clone) => clone,
                None => return self.send_once(request).await,
            };
            match self.send_once(this_try).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let backoff = backoff_delay(attempt);
                    tracing::warn!(
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        error = %e,
                        "Transport failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: RequestBuilder) -> Result<HttpResponse, AppError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}

/// Linear backoff: 2s after the first failure, 4s after the second.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2 * u64::from(attempt))
}
