//! Telemetry pipeline
//!
//! Owns the queue, counters and worker task. Producers call [`TelemetryPipeline::enqueue`]
//! from any thread; it never blocks. `flush` and `shutdown` are the only
//! operations that wait on the collector.

use super::queue::EventQueue;
use super::sink::TelemetrySink;
use super::stats::{StatsSnapshot, TelemetryStats};
use super::worker::{BatchDispatcher, BatchWorker};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokentra_common::{Result, TelemetryEvent, TokenTraError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Tuning for the queue and worker
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Flush when the batch holds this many events
    pub batch_size: usize,
    /// Flush a non-empty batch after this long
    pub flush_interval: Duration,
    /// Worker pull timeout; the liveness tick for the time trigger
    pub poll_interval: Duration,
    pub max_queue_size: usize,
    /// Upper bound on waiting for the worker during shutdown
    pub shutdown_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            max_queue_size: 1000,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Queue, worker and counters for one SDK instance
pub struct TelemetryPipeline {
    settings: PipelineSettings,
    queue: Arc<EventQueue>,
    stats: Arc<TelemetryStats>,
    dispatcher: Arc<BatchDispatcher>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryPipeline {
    /// Create the queue and launch the worker. Requires a running tokio runtime.
    pub fn start(settings: PipelineSettings, sink: Arc<dyn TelemetrySink>) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(TokenTraError::Config("batch_size must be greater than 0".into()));
        }
        if settings.max_queue_size == 0 {
            return Err(TokenTraError::Config(
                "max_queue_size must be greater than 0".into(),
            ));
        }
        tokio::runtime::Handle::try_current().map_err(|e| {
            TokenTraError::Internal(format!("Telemetry pipeline needs a tokio runtime: {}", e))
        })?;

        let queue = Arc::new(EventQueue::new(settings.max_queue_size));
        let stats = Arc::new(TelemetryStats::new());
        let dispatcher = Arc::new(BatchDispatcher::new(sink, stats.clone()));
        let cancel = CancellationToken::new();

        let worker = BatchWorker::new(&settings, queue.clone(), dispatcher.clone());
        let handle = worker.spawn(cancel.clone());

        info!(
            batch_size = settings.batch_size,
            flush_interval_ms = settings.flush_interval.as_millis() as u64,
            max_queue_size = settings.max_queue_size,
            "Telemetry pipeline started"
        );

        Ok(Self {
            settings,
            queue,
            stats,
            dispatcher,
            cancel,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Queue an event without blocking. Returns false if it was dropped.
    pub fn enqueue(&self, event: TelemetryEvent) -> bool {
        // Counted before the push: the worker may send the event before this returns.
        self.stats.record_buffered();
        match self.queue.try_push(event) {
            Ok(()) => true,
            Err(rejected) => {
                self.stats.record_dropped();
                warn!(
                    request_id = %rejected.request_id,
                    capacity = self.queue.capacity(),
                    "Telemetry queue full, dropping event"
                );
                false
            }
        }
    }

    /// Send everything currently queued as one batch
    #[instrument(skip(self))]
    pub async fn flush(&self) {
        let events = self.queue.drain_all();
        if events.is_empty() {
            return;
        }
        self.dispatcher.dispatch(events).await;
    }

    /// Stop the worker, wait for its final flush, then flush the queue.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.settings.shutdown_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Telemetry worker exited abnormally: {}", e),
                Err(_) => warn!(
                    timeout_ms = self.settings.shutdown_timeout.as_millis() as u64,
                    "Telemetry worker did not stop in time"
                ),
            }
            info!("Telemetry pipeline shut down");
        }

        self.flush().await;
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared counters, for call sites that record tracked requests and errors
    pub fn counters(&self) -> &Arc<TelemetryStats> {
        &self.stats
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for TelemetryPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metering::testing::RecordingSink;
    use async_trait::async_trait;
    use tokentra_common::{CostBreakdown, TokenUsage};

    /// Sink whose sends never complete
    struct StuckSink;

    #[async_trait]
    impl TelemetrySink for StuckSink {
        async fn send(&self, _events: &[TelemetryEvent]) -> Result<()> {
            std::future::pending().await
        }
    }

    fn event() -> TelemetryEvent {
        TelemetryEvent::new(
            "anthropic",
            "claude-3-haiku-20240307",
            TokenUsage::new(20, 10),
            CostBreakdown::zero(),
            3,
        )
    }

    fn pipeline(settings: PipelineSettings, sink: Arc<RecordingSink>) -> TelemetryPipeline {
        TelemetryPipeline::start(settings, sink).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_everything() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(
            PipelineSettings {
                batch_size: 4,
                flush_interval: Duration::from_secs(60),
                ..Default::default()
            },
            sink.clone(),
        );

        for _ in 0..11 {
            assert!(pipeline.enqueue(event()));
        }
        pipeline.shutdown().await;

        let snap = pipeline.stats();
        assert_eq!(snap.telemetry_sent + snap.telemetry_failed, 11);
        assert_eq!(snap.telemetry_buffered, 0);
        assert_eq!(pipeline.queue_depth(), 0);
        assert!(pipeline.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_counts_failures() {
        let sink = Arc::new(RecordingSink::failing());
        let pipeline = pipeline(PipelineSettings::default(), sink);

        for _ in 0..7 {
            pipeline.enqueue(event());
        }
        pipeline.shutdown().await;

        let snap = pipeline.stats();
        assert_eq!(snap.telemetry_failed, 7);
        assert_eq!(snap.telemetry_sent, 0);
        assert_eq!(snap.telemetry_buffered, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(PipelineSettings::default(), sink.clone());

        pipeline.enqueue(event());
        pipeline.shutdown().await;
        pipeline.shutdown().await;

        assert_eq!(pipeline.stats().telemetry_sent, 1);
        assert_eq!(sink.batch_sizes().iter().sum::<usize>(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_sends_one_batch_and_skips_empty() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(
            PipelineSettings {
                batch_size: 100,
                flush_interval: Duration::from_secs(3600),
                ..Default::default()
            },
            sink.clone(),
        );

        pipeline.flush().await;
        assert!(sink.batch_sizes().is_empty());

        pipeline.shutdown().await;
        for _ in 0..5 {
            pipeline.enqueue(event());
        }
        pipeline.flush().await;

        assert_eq!(sink.batch_sizes(), vec![5]);
        assert_eq!(pipeline.stats().telemetry_sent, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_drops_and_counts() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(
            PipelineSettings {
                max_queue_size: 2,
                ..Default::default()
            },
            sink,
        );

        // No await between pushes, so the worker cannot drain in between.
        assert!(pipeline.enqueue(event()));
        assert!(pipeline.enqueue(event()));
        assert!(!pipeline.enqueue(event()));

        let snap = pipeline.stats();
        assert_eq!(snap.telemetry_dropped, 1);
        assert_eq!(snap.telemetry_buffered, 2);

        pipeline.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_producers_leave_nothing_buffered() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(
            PipelineSettings {
                batch_size: 1,
                max_queue_size: 8000,
                ..Default::default()
            },
            sink.clone(),
        );

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..2000 {
                        assert!(pipeline.enqueue(event()));
                    }
                });
            }
        });
        pipeline.shutdown().await;

        let snap = pipeline.stats();
        assert_eq!(snap.telemetry_sent, 8000);
        assert_eq!(snap.telemetry_dropped, 0);
        assert_eq!(snap.telemetry_buffered, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wait_is_bounded() {
        let pipeline = TelemetryPipeline::start(
            PipelineSettings {
                batch_size: 1,
                ..Default::default()
            },
            Arc::new(StuckSink),
        )
        .unwrap();

        pipeline.enqueue(event());
        // Let the worker pick the event up and block inside the sink.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(pipeline.queue_depth(), 0);

        let started = tokio::time::Instant::now();
        pipeline.shutdown().await;

        let waited = started.elapsed();
        assert!(waited >= pipeline.settings().shutdown_timeout);
        assert!(waited < Duration::from_secs(6));
        assert!(pipeline.is_shut_down());
        assert_eq!(pipeline.stats().telemetry_sent, 0);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let sink = Arc::new(RecordingSink::default());
        let err = TelemetryPipeline::start(PipelineSettings::default(), sink)
            .err()
            .unwrap();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_rejects_zero_sizes() {
        let sink = Arc::new(RecordingSink::default());
        let result = TelemetryPipeline::start(
            PipelineSettings {
                batch_size: 0,
                ..Default::default()
            },
            sink,
        );
        assert!(matches!(result, Err(TokenTraError::Config(_))));
    }
}
