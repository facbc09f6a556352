//! Instrumentation hooks.
//!
//! A [`ChainObserver`] is handed to a chain explicitly. The engine itself keeps no
//! global counters; anything that wants timings or counts implements this trait.

use crate::error::EventResult;
use crate::result::{ChainResult, EventFailure};
use std::time::Duration;

/// Receives notifications while a chain executes.
///
/// All methods default to doing nothing, so an observer only implements the
/// callbacks it cares about.
pub trait ChainObserver: 'static {
    /// A run is starting with `event_count` registered events.
    fn on_chain_start(&self, event_count: usize) {
        let _ = event_count;
    }

    /// `name` is about to run (outside all middleware).
    fn on_event_start(&self, name: &str) {
        let _ = name;
    }

    /// `name` finished with `result` after `elapsed`, including middleware time.
    fn on_event_end(&self, name: &str, result: &EventResult, elapsed: Duration) {
        let _ = (name, result, elapsed);
    }

    /// A failure was appended to the run's log.
    fn on_failure(&self, failure: &EventFailure) {
        let _ = failure;
    }

    /// The run finished.
    fn on_chain_end(&self, result: &ChainResult, elapsed: Duration) {
        let _ = (result, elapsed);
    }
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ChainObserver for NoopObserver {}
