//! # TokenTra Common
//!
//! Shared types and errors for the TokenTra usage-telemetry SDK.
//!
//! ## Core Types
//!
//! - [`TelemetryEvent`]: one tracked AI call with usage, cost, and attribution
//! - [`Attribution`]: per-call cost allocation metadata
//! - [`TokenUsage`]/[`CostBreakdown`]: token counts and the priced result
//! - [`ApiKey`]: validated collector credential
//!
//! ## Errors
//!
//! - [`TokenTraError`]: unified error taxonomy with wire codes and retryability

pub mod error;
pub mod types;

pub use error::{Result, TokenTraError};
pub use types::{
    api_key::ApiKey,
    attribution::{Attribution, AttributionDefaults},
    event::TelemetryEvent,
    usage::{CostBreakdown, TokenUsage},
};

/// SDK version reported with every event and batch
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SDK language tag reported with every event and batch
pub const SDK_LANGUAGE: &str = "rust";

/// Collector ingest path, appended to the configured API URL
pub const INGEST_PATH: &str = "/api/v1/sdk/ingest";

/// Error messages carried on error events are truncated to this many characters
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Environment attributed to events when neither the call nor the config sets one
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Model name recorded when a request does not name one
pub const UNKNOWN_MODEL: &str = "unknown";
