//! # TokenTra Meter
//!
//! Prices tracked AI calls and moves their telemetry to the collector.
//!
//! ## Pipeline
//!
//! ```text
//! call sites ──try_push──► EventQueue ──pull──► BatchWorker ──batch──► TelemetrySink
//!     (many, never block)    (bounded)        (size or time trigger)   (HTTP POST)
//! ```
//!
//! - Producers never block: a full queue rejects the event and counts a drop.
//! - One worker accumulates a batch and flushes on `batch_size` or
//!   `flush_interval`, whichever comes first.
//! - Failed batches are counted and discarded, never retried.
//! - Shutdown flushes the worker's residual batch, then drains the queue.

pub mod metering;
pub mod pricing;

pub use metering::{
    BatchDispatcher, BatchWorker, EventQueue, HttpIngestSink, PipelineSettings, StatsSnapshot,
    TelemetryPipeline, TelemetrySink, TelemetryStats,
};
pub use pricing::{resolve_cost, ModelRate};
