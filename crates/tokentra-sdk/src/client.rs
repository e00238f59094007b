//! TokenTra lifecycle controller
//!
//! `TokenTra` is a cheap handle over shared state: the configuration and the
//! telemetry pipeline. Wrapped clients hold the same state, so telemetry keeps
//! flowing for as long as any handle or wrapped client is alive.

use crate::config::TokenTraConfig;
use crate::logging;
use crate::shim::{Provider, ProviderClient, Tracked};
use std::sync::Arc;
use tokentra_common::{
    Attribution, Result, TelemetryEvent, TokenTraError, TokenUsage, SDK_VERSION,
};
use tokentra_meter::{
    resolve_cost, HttpIngestSink, StatsSnapshot, TelemetryPipeline, TelemetrySink,
};
use tracing::{debug, info};

/// State shared by the SDK handle and every wrapped client
pub(crate) struct SdkCore {
    pub(crate) config: TokenTraConfig,
    pipeline: TelemetryPipeline,
}

impl SdkCore {
    /// Queue the event for a completed call
    pub(crate) fn record_success(&self, event: TelemetryEvent) -> bool {
        let stats = self.pipeline.counters();
        stats.record_cache(event.is_cache_hit());
        let queued = self.pipeline.enqueue(event);
        stats.record_tracked();
        queued
    }

    /// Queue the event for a failed call
    pub(crate) fn record_failure(&self, event: TelemetryEvent) -> bool {
        self.pipeline.counters().record_error();
        self.pipeline.enqueue(event)
    }
}

/// Usage reported by hand, for calls made outside a wrapped client
#[derive(Debug, Clone)]
pub struct ManualUsage {
    provider: String,
    model: String,
    usage: TokenUsage,
    latency_ms: u64,
    attribution: Attribution,
    was_cached: bool,
    routing: Option<(String, Option<String>)>,
    prompt_hash: Option<String>,
}

impl ManualUsage {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            usage: TokenUsage::new(input_tokens, output_tokens),
            latency_ms: 0,
            attribution: Attribution::default(),
            was_cached: false,
            routing: None,
            prompt_hash: None,
        }
    }

    pub fn latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn cached_tokens(mut self, cached_tokens: u64) -> Self {
        self.usage = self.usage.with_cached(cached_tokens);
        self
    }

    /// Response came from a cache in front of the provider
    pub fn was_cached(mut self, was_cached: bool) -> Self {
        self.was_cached = was_cached;
        self
    }

    pub fn attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// The call was routed away from `original_model`
    pub fn routed_from(
        mut self,
        original_model: impl Into<String>,
        rule: Option<String>,
    ) -> Self {
        self.routing = Some((original_model.into(), rule));
        self
    }

    pub fn prompt_hash(mut self, prompt_hash: impl Into<String>) -> Self {
        self.prompt_hash = Some(prompt_hash.into());
        self
    }

    fn into_event(self, config: &TokenTraConfig) -> TelemetryEvent {
        let cost = resolve_cost(&self.provider, &self.model, self.usage);
        let mut event = TelemetryEvent::new(
            self.provider,
            self.model,
            self.usage,
            cost,
            self.latency_ms,
        )
        .with_attribution(self.attribution.resolve(&config.defaults))
        .with_cache_hit(self.was_cached)
        .with_prompt_hash(self.prompt_hash);

        if let Some((original_model, rule)) = self.routing {
            event = event.with_routing(original_model, rule);
        }
        event
    }
}

/// TokenTra SDK handle
///
/// ```no_run
/// # async fn run() -> tokentra_sdk::Result<()> {
/// use tokentra_sdk::{ManualUsage, TokenTra, TokenTraConfig};
///
/// let sdk = TokenTra::start(TokenTraConfig::builder("tt_live_xxx").build()?)?;
/// sdk.track(ManualUsage::new("openai", "gpt-4o", 1000, 500).latency_ms(820));
/// sdk.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TokenTra {
    core: Arc<SdkCore>,
}

impl TokenTra {
    /// Start the SDK with the HTTP collector sink. Requires a tokio runtime.
    pub fn start(config: TokenTraConfig) -> Result<Self> {
        let sink = HttpIngestSink::new(&config.api_url, config.api_key.clone(), config.timeout())?;
        Self::start_with_sink(config, Arc::new(sink))
    }

    /// Start from `TOKENTRA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::start(TokenTraConfig::from_env()?)
    }

    /// Start with a custom delivery sink
    pub fn start_with_sink(config: TokenTraConfig, sink: Arc<dyn TelemetrySink>) -> Result<Self> {
        logging::init(config.log_level);

        let pipeline = TelemetryPipeline::start(config.pipeline_settings(), sink)?;
        info!(
            version = SDK_VERSION,
            api_url = %config.api_url,
            test_key = config.api_key.is_test(),
            "TokenTra SDK initialized"
        );

        Ok(Self {
            core: Arc::new(SdkCore { config, pipeline }),
        })
    }

    /// Wrap a provider client so every call is metered
    pub fn wrap<C: ProviderClient>(&self, client: C) -> Result<Tracked<C>> {
        let identity = client.identity();
        let provider = client
            .provider_hint()
            .or_else(|| Provider::detect(&identity))
            .ok_or_else(|| {
                TokenTraError::UnsupportedProvider(format!(
                    "{} is not a supported AI client. Supported: OpenAI, Anthropic",
                    identity
                ))
            })?;

        debug!(%provider, client = %identity, "Wrapped AI client");
        Ok(Tracked::new(client, provider, self.core.clone()))
    }

    /// Record a call made outside a wrapped client. Returns false if the event
    /// was dropped because the queue is full.
    pub fn track(&self, usage: ManualUsage) -> bool {
        let event = usage.into_event(&self.core.config);
        self.core.record_success(event)
    }

    /// Send everything queued right now as one batch
    pub async fn flush(&self) {
        self.core.pipeline.flush().await;
    }

    /// Stop the worker and deliver what is left. Safe to call more than once.
    pub async fn shutdown(&self) {
        info!("Shutting down TokenTra SDK...");
        self.core.pipeline.shutdown().await;
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.core.pipeline.stats()
    }

    pub fn config(&self) -> &TokenTraConfig {
        &self.core.config
    }

    /// Events waiting in the queue
    pub fn queue_depth(&self) -> usize {
        self.core.pipeline.queue_depth()
    }
}
