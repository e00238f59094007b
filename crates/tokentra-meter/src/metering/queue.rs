//! Bounded event queue
//!
//! FIFO buffer between call sites and the batching worker. Pushing never
//! blocks: when the queue is at capacity the new event is handed back to the
//! caller. Only the worker waits, and only up to a bounded timeout.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokentra_common::TelemetryEvent;
use tokio::sync::Notify;

/// Fixed-capacity, multi-producer event queue
#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<VecDeque<TelemetryEvent>>,
    capacity: usize,
    available: Notify,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
            available: Notify::new(),
        }
    }

    /// Append an event, or return it if the queue is full
    pub fn try_push(&self, event: TelemetryEvent) -> Result<(), TelemetryEvent> {
        {
            let mut events = self.events.lock();
            if events.len() >= self.capacity {
                return Err(event);
            }
            events.push_back(event);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Remove the oldest event without waiting
    pub fn try_pop(&self) -> Option<TelemetryEvent> {
        self.events.lock().pop_front()
    }

    /// Wait up to `timeout` for the oldest event
    pub async fn pull_timeout(&self, timeout: Duration) -> Option<TelemetryEvent> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let notified = self.available.notified();
            if let Some(event) = self.try_pop() {
                return Some(event);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_pop();
            }
        }
    }

    /// Take everything currently queued, oldest first
    pub fn drain_all(&self) -> Vec<TelemetryEvent> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
