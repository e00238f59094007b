//! # TokenTra SDK
//!
//! Track token usage, cost, and attribution of AI provider calls.
//!
//! ## Usage
//!
//! - [`TokenTra::start`]: validate configuration and launch the telemetry worker
//! - [`TokenTra::wrap`]: decorate a [`ProviderClient`] so every call is metered
//! - [`TokenTra::track`]: report usage of calls made without a wrapped client
//! - [`TokenTra::shutdown`]: stop the worker and deliver what is left
//!
//! Telemetry delivery never fails an application call. Delivery problems show
//! up only in [`TokenTra::stats`] and in `warn`-level logs.

pub mod client;
pub mod config;
pub mod logging;
pub mod shim;

pub use client::{ManualUsage, TokenTra};
pub use config::{PrivacyMode, TokenTraConfig, TokenTraConfigBuilder};
pub use shim::{ClientIdentity, Provider, ProviderClient, Tracked};

pub use tokentra_common::{
    ApiKey, Attribution, AttributionDefaults, CostBreakdown, Result, TelemetryEvent,
    TokenTraError, TokenUsage,
};
pub use tokentra_meter::{StatsSnapshot, TelemetrySink};
