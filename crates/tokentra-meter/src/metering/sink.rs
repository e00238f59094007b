//! Collector delivery
//!
//! A sink receives one formed batch at a time. The HTTP sink posts
//! `{"events": [...]}` to `{api_url}/api/v1/sdk/ingest`; any non-2xx status is a
//! batch failure.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tokentra_common::{
    ApiKey, Result, TelemetryEvent, TokenTraError, INGEST_PATH, SDK_LANGUAGE, SDK_VERSION,
};
use tracing::instrument;

/// Destination for telemetry batches
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Deliver one batch in a single call
    async fn send(&self, events: &[TelemetryEvent]) -> Result<()>;
}

#[derive(Serialize)]
struct IngestPayload<'a> {
    events: &'a [TelemetryEvent],
}

/// HTTP sink for the TokenTra collector
pub struct HttpIngestSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
}

impl HttpIngestSink {
    /// Build a sink; `timeout` bounds each POST end to end
    pub fn new(api_url: &str, api_key: ApiKey, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TokenTraError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), INGEST_PATH),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TelemetrySink for HttpIngestSink {
    #[instrument(skip(self, events), fields(batch_size = events.len()))]
    async fn send(&self, events: &[TelemetryEvent]) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .header(CONTENT_TYPE, "application/json")
            .header("X-SDK-Version", SDK_VERSION)
            .header("X-SDK-Language", SDK_LANGUAGE)
            .json(&IngestPayload { events })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        let message = collector_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TokenTraError::RateLimit {
                message,
                retry_after_secs: retry_after_secs
                    .unwrap_or(TokenTraError::DEFAULT_RETRY_AFTER_SECS),
            });
        }

        Err(TokenTraError::Collector {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport_error(err: reqwest::Error) -> TokenTraError {
    if err.is_timeout() {
        TokenTraError::Timeout(err.to_string())
    } else {
        TokenTraError::Network(err.to_string())
    }
}

/// Pull `error.message` out of a collector error body
fn collector_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
