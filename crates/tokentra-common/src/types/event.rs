//! Telemetry event
//!
//! One record per tracked AI call. Events are built at the call site, moved
//! into the queue, and serialized once by the batching worker.
//!
//! Serialization is sparse: optional attribution, caching, routing, error, and
//! request-shape fields are omitted when unset, empty, or false.

use crate::types::attribution::Attribution;
use crate::types::usage::{CostBreakdown, TokenUsage};
use crate::{MAX_ERROR_MESSAGE_CHARS, SDK_LANGUAGE, SDK_VERSION};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Usage event describing one provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Unique request ID (UUID)
    pub request_id: String,
    /// ISO-8601 UTC timestamp
    pub timestamp: String,
    /// Provider name (e.g. "openai")
    pub provider: String,
    /// Model identifier as requested
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Always `input_tokens + output_tokens`
    pub total_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    /// Always `input_cost + output_cost + cached_cost`
    pub total_cost: f64,
    /// Wall-clock latency of the provider call
    pub latency_ms: u64,
    pub sdk_version: String,
    pub sdk_language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub was_cached: bool,

    /// Model the caller asked for before routing rewrote it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routed_by_rule: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_path: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_streaming: bool,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TelemetryEvent {
    /// Create an event for a completed call.
    ///
    /// Totals are derived here so the token and cost invariants always hold.
    /// Cached fields are only populated when the provider reported cached tokens;
    /// otherwise any cached cost is ignored.
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
        cost: CostBreakdown,
        latency_ms: u64,
    ) -> Self {
        let has_cached = usage.cached_tokens > 0;
        let cached_cost = if has_cached { cost.cached_cost } else { 0.0 };
        let cost = CostBreakdown::new(cost.input_cost, cost.output_cost, cached_cost);

        Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            provider: provider.into(),
            model: model.into(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens(),
            input_cost: cost.input_cost,
            output_cost: cost.output_cost,
            total_cost: cost.total_cost,
            latency_ms,
            sdk_version: SDK_VERSION.to_string(),
            sdk_language: SDK_LANGUAGE.to_string(),
            feature: None,
            team: None,
            project: None,
            cost_center: None,
            user_id: None,
            environment: None,
            cached_tokens: has_cached.then_some(usage.cached_tokens),
            cached_cost: has_cached.then_some(cost.cached_cost),
            was_cached: false,
            original_model: None,
            routed_by_rule: None,
            is_error: false,
            error_code: None,
            error_message: None,
            prompt_hash: None,
            method_path: None,
            is_streaming: false,
            metadata: Map::new(),
        }
    }

    /// Create an event for a failed call: zero usage and cost, error fields set
    pub fn failure(
        provider: impl Into<String>,
        model: impl Into<String>,
        latency_ms: u64,
        error_code: impl Into<String>,
        error_message: &str,
    ) -> Self {
        let mut event = Self::new(
            provider,
            model,
            TokenUsage::default(),
            CostBreakdown::zero(),
            latency_ms,
        );
        event.is_error = true;
        event.error_code = Some(error_code.into());
        event.error_message = Some(truncate_chars(error_message, MAX_ERROR_MESSAGE_CHARS));
        event
    }

    /// Use a request ID generated before the call started
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id.to_string();
        self
    }

    /// Apply resolved attribution
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.feature = attribution.feature;
        self.team = attribution.team;
        self.project = attribution.project;
        self.cost_center = attribution.cost_center;
        self.user_id = attribution.user_id;
        self.environment = attribution.environment;
        self.metadata = attribution.metadata;
        self
    }

    /// Mark the response as served from a cache
    pub fn with_cache_hit(mut self, was_cached: bool) -> Self {
        self.was_cached = was_cached;
        self
    }

    /// Record model routing
    pub fn with_routing(
        mut self,
        original_model: impl Into<String>,
        routed_by_rule: Option<String>,
    ) -> Self {
        self.original_model = Some(original_model.into());
        self.routed_by_rule = routed_by_rule;
        self
    }

    pub fn with_prompt_hash(mut self, prompt_hash: Option<String>) -> Self {
        self.prompt_hash = prompt_hash;
        self
    }

    /// Record which client method was called and whether it streamed
    pub fn with_request_shape(mut self, method_path: impl Into<String>, is_streaming: bool) -> Self {
        self.method_path = Some(method_path.into());
        self.is_streaming = is_streaming;
        self
    }

    /// Whether this event counts as a cache hit
    pub fn is_cache_hit(&self) -> bool {
        self.was_cached || self.cached_tokens.unwrap_or(0) > 0
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}
