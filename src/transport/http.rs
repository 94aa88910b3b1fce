use crate::{BoxStream, Error, Result};
use futures::TryStreamExt;
use reqwest::Proxy;
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error response body carried into `BackendUnavailable`.
const ERROR_BODY_EXCERPT: usize = 512;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        // The overall timeout covers the whole streamed body, so it is generous.
        let timeout_secs = env_u64("DOBBY_HTTP_TIMEOUT_SECS").unwrap_or(120);
        let connect_timeout_secs = env_u64("DOBBY_HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(10);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .pool_max_idle_per_host(
                env::var("DOBBY_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("DOBBY_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a streaming request and return the response once its status is known good.
    ///
    /// Connection failures and non-2xx statuses both surface as `BackendUnavailable`,
    /// before any body bytes are consumed.
    pub async fn post_stream(
        &self,
        path: &str,
        request_body: &serde_json::Value,
        request_id: &str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("accept", "text/event-stream")
            .header("x-request-id", request_id)
            .json(request_body)
            .send()
            .await
            .map_err(|e| Error::backend_unavailable(e.to_string(), None))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = provider_error_message(&body)
                .unwrap_or_else(|| excerpt(&body, ERROR_BODY_EXCERPT));
            debug!(%url, status = status.as_u16(), "backend rejected streaming request");
            return Err(Error::backend_unavailable(
                if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
                Some(status.as_u16()),
            ));
        }

        Ok(resp)
    }

    /// Convert a response body into the crate's unified byte stream.
    pub fn byte_stream(resp: reqwest::Response) -> BoxStream<'static, bytes::Bytes> {
        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Box::pin(byte_stream)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

/// OpenAI-compatible error envelope: `{"error": {"message": "..."}}`.
fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

fn excerpt(body: &str, max_chars: usize) -> String {
    body.trim().chars().take(max_chars).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
