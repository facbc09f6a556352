//! Standard chain observers.

use catena_core::{ChainObserver, ChainResult, EventFailure, EventResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// An observer that emits structured `tracing` records for every notification.
///
/// Without the `tracing` feature it does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ChainObserver for TracingObserver {
    fn on_chain_start(&self, event_count: usize) {
        #[cfg(feature = "tracing")]
        tracing::info!(event_count, "chain started");
        #[cfg(not(feature = "tracing"))]
        let _ = event_count;
    }

    fn on_event_end(&self, name: &str, result: &EventResult, elapsed: Duration) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            event = name,
            ok = result.is_ok(),
            elapsed_us = elapsed.as_micros() as u64,
            "event finished"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (name, result, elapsed);
    }

    fn on_failure(&self, failure: &EventFailure) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            event = %failure.event_name,
            code = failure.code.as_u8(),
            message = %failure.message,
            "failure recorded"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = failure;
    }

    fn on_chain_end(&self, result: &ChainResult, elapsed: Duration) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            success = result.success,
            failures = result.failures.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "chain finished"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (result, elapsed);
    }
}

/// An observer that counts runs, events and failures.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct CountingObserver {
    runs: Arc<AtomicUsize>,
    events: Arc<AtomicUsize>,
    failed_events: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl CountingObserver {
    /// Create an observer with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed runs.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Events that ran, successful or not.
    pub fn events(&self) -> usize {
        self.events.load(Ordering::SeqCst)
    }

    /// Events that returned an error.
    pub fn failed_events(&self) -> usize {
        self.failed_events.load(Ordering::SeqCst)
    }

    /// Failures appended to result logs, including run-level ones.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [&self.runs, &self.events, &self.failed_events, &self.failures] {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

impl ChainObserver for CountingObserver {
    fn on_event_end(&self, _name: &str, result: &EventResult, _elapsed: Duration) {
        self.events.fetch_add(1, Ordering::SeqCst);
        if result.is_err() {
            self.failed_events.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_failure(&self, _failure: &EventFailure) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_chain_end(&self, _result: &ChainResult, _elapsed: Duration) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}
