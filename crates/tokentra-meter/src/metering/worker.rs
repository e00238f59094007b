//! Batching worker
//!
//! A single background task drains the queue into an in-memory batch and
//! flushes it when the batch reaches `batch_size` or when a non-empty batch has
//! waited `flush_interval` since the last flush. The short pull timeout is the
//! tick that lets the time trigger fire while the queue is idle.

use super::queue::EventQueue;
use super::sink::TelemetrySink;
use super::stats::TelemetryStats;
use super::PipelineSettings;
use std::sync::Arc;
use std::time::Duration;
use tokentra_common::TelemetryEvent;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sends batches and keeps the delivery counters
pub struct BatchDispatcher {
    sink: Arc<dyn TelemetrySink>,
    stats: Arc<TelemetryStats>,
}

impl BatchDispatcher {
    pub fn new(sink: Arc<dyn TelemetrySink>, stats: Arc<TelemetryStats>) -> Self {
        Self { sink, stats }
    }

    /// Send one batch. Success or failure, the batch is gone afterwards.
    pub async fn dispatch(&self, events: Vec<TelemetryEvent>) -> bool {
        if events.is_empty() {
            return true;
        }

        let count = events.len() as u64;
        match self.sink.send(&events).await {
            Ok(()) => {
                self.stats.record_sent(count);
                debug!(count, "Sent telemetry events");
                true
            }
            Err(e) => {
                self.stats.record_failed(count);
                warn!(
                    count,
                    code = e.code(),
                    retryable = e.is_retryable(),
                    "Failed to send telemetry: {}",
                    e
                );
                false
            }
        }
    }
}

/// Background consumer of the event queue
pub struct BatchWorker {
    batch_size: usize,
    flush_interval: Duration,
    poll_interval: Duration,
    queue: Arc<EventQueue>,
    dispatcher: Arc<BatchDispatcher>,
}

impl BatchWorker {
    pub fn new(
        settings: &PipelineSettings,
        queue: Arc<EventQueue>,
        dispatcher: Arc<BatchDispatcher>,
    ) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            flush_interval: settings.flush_interval,
            poll_interval: settings.poll_interval,
            queue,
            dispatcher,
        }
    }

    /// Start the worker on the current tokio runtime
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        let mut batch: Vec<TelemetryEvent> = Vec::with_capacity(self.batch_size);
        let mut last_flush = Instant::now();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                pulled = self.queue.pull_timeout(self.poll_interval) => {
                    if let Some(event) = pulled {
                        batch.push(event);
                    }
                }
            }

            let size_reached = batch.len() >= self.batch_size;
            let interval_elapsed =
                !batch.is_empty() && last_flush.elapsed() >= self.flush_interval;

            if size_reached || interval_elapsed {
                self.dispatcher.dispatch(std::mem::take(&mut batch)).await;
                last_flush = Instant::now();
            }
        }

        // Final flush on shutdown; events still queued are left for the caller
        if !batch.is_empty() {
            self.dispatcher.dispatch(batch).await;
        }
        info!("Telemetry worker stopped");
    }
}
