//! Telemetry metering
//!
//! Bounded queue, background batching worker, collector delivery and the
//! counters shared between them.

pub mod pipeline;
pub mod queue;
pub mod sink;
pub mod stats;
pub mod worker;

pub use pipeline::{PipelineSettings, TelemetryPipeline};
pub use queue::EventQueue;
pub use sink::{HttpIngestSink, TelemetrySink};
pub use stats::{StatsSnapshot, TelemetryStats};
pub use worker::{BatchDispatcher, BatchWorker};
