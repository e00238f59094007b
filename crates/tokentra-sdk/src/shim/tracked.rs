//! Metering decorator
//!
//! [`Tracked`] delegates to the wrapped client and records one event per call,
//! on success and on failure. The wrapped client's response or error is
//! returned unchanged.

use super::provider::{short_type_name, Provider};
use super::{ClientIdentity, ProviderClient};
use crate::client::SdkCore;
use crate::config::PrivacyMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokentra_common::{Attribution, TelemetryEvent, UNKNOWN_MODEL};
use tokentra_meter::resolve_cost;
use tracing::debug;
use uuid::Uuid;

/// A provider client whose calls are metered
pub struct Tracked<C> {
    inner: C,
    provider: Provider,
    core: Arc<SdkCore>,
}

/// What the shim reads from a request before handing it over
struct CallContext {
    request_id: Uuid,
    model: String,
    streaming: bool,
    prompt_hash: Option<String>,
}

/// Borrowed view of the request fields the shim reads; everything else,
/// prompts included, is skipped without being parsed
#[derive(Deserialize, Default)]
struct RequestView<'a> {
    model: Option<Value>,
    stream: Option<Value>,
    #[serde(borrow)]
    messages: Option<&'a RawValue>,
    #[serde(borrow)]
    prompt: Option<&'a RawValue>,
}

impl CallContext {
    fn capture<R: Serialize>(request: &R, privacy_mode: PrivacyMode) -> Self {
        let bytes = serde_json::to_vec(request).unwrap_or_else(|e| {
            debug!("Request not inspectable: {}", e);
            Vec::new()
        });
        let view: RequestView<'_> = serde_json::from_slice(&bytes).unwrap_or_default();

        let model = view
            .model
            .as_ref()
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_MODEL)
            .to_string();
        let streaming = view.stream.as_ref().and_then(Value::as_bool).unwrap_or(false);
        let prompt_hash = match privacy_mode {
            PrivacyMode::Hashed => view.messages.or(view.prompt).map(|raw| digest(raw.get())),
            PrivacyMode::MetricsOnly => None,
        };

        Self {
            request_id: Uuid::new_v4(),
            model,
            streaming,
            prompt_hash,
        }
    }
}

/// BLAKE3 hex digest of a request's `messages` (or `prompt`) field
pub fn prompt_hash(request: &Value) -> Option<String> {
    let prompt = request
        .get("messages")
        .or_else(|| request.get("prompt"))
        .filter(|p| !p.is_null())?;
    Some(digest(&prompt.to_string()))
}

fn digest(prompt_json: &str) -> String {
    blake3::hash(prompt_json.as_bytes()).to_hex().to_string()
}

impl<C: ProviderClient> Tracked<C> {
    pub(crate) fn new(inner: C, provider: Provider, core: Arc<SdkCore>) -> Self {
        Self {
            inner,
            provider,
            core,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Call the wrapped client with per-call attribution
    pub async fn create_with(
        &self,
        request: C::Request,
        attribution: Option<Attribution>,
    ) -> Result<C::Response, C::Error> {
        let call = CallContext::capture(&request, self.core.config.privacy_mode);
        let started = Instant::now();

        let outcome = self.inner.create(request).await;

        let latency_ms = started.elapsed().as_millis() as u64;
        let attribution = attribution
            .unwrap_or_default()
            .resolve(&self.core.config.defaults);

        match &outcome {
            Ok(response) => {
                let usage = serde_json::to_value(response)
                    .map(|v| self.provider.extract_usage(&v))
                    .unwrap_or_default();
                let cost = resolve_cost(self.provider.as_str(), &call.model, usage);

                let event = TelemetryEvent::new(
                    self.provider.as_str(),
                    call.model,
                    usage,
                    cost,
                    latency_ms,
                )
                .with_request_id(call.request_id)
                .with_attribution(attribution)
                .with_prompt_hash(call.prompt_hash)
                .with_request_shape(self.provider.method_path(), call.streaming);
                self.core.record_success(event);
            }
            Err(err) => {
                let error_code = short_type_name(std::any::type_name::<C::Error>());
                let event = TelemetryEvent::failure(
                    self.provider.as_str(),
                    call.model,
                    latency_ms,
                    error_code,
                    &err.to_string(),
                )
                .with_request_id(call.request_id)
                .with_attribution(attribution)
                .with_prompt_hash(call.prompt_hash)
                .with_request_shape(self.provider.method_path(), call.streaming);
                self.core.record_failure(event);
            }
        }

        outcome
    }
}

#[async_trait]
impl<C: ProviderClient> ProviderClient for Tracked<C> {
    type Request = C::Request;
    type Response = C::Response;
    type Error = C::Error;

    fn identity(&self) -> ClientIdentity {
        self.inner.identity()
    }

    fn provider_hint(&self) -> Option<Provider> {
        Some(self.provider)
    }

    async fn create(&self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        self.create_with(request, None).await
    }
}
