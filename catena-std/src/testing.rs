//! Testing utilities for Catena.
//!
//! This module provides fixtures that make testing chains, events and middleware
//! easier.
//!
//! # Features
//!
//! - [`RecordingMiddleware`]: A middleware that records the events it wraps
//! - [`CountingEvent`]: An event that counts its executions
//! - [`FailingEvent`]: An event that always fails with a fixed error
//! - [`PassthroughMiddleware`]: A middleware that only continues inward
//! - [`ShortCircuitMiddleware`]: A middleware that never continues inward

use catena_core::{
    ChainableEvent, ErrorCode, Event, EventContext, EventError, EventResult, Middleware, Next,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recording Middleware
// ============================================================================

/// A middleware that records, in order, the name of every event it wraps.
///
/// Entries are pushed before calling inward (`"<label>:<event>"`), so several
/// recorders show the onion order.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingMiddleware::new("outer");
/// chain.use_middleware(EventMiddleware::new("outer", recorder.clone()))?;
///
/// chain.execute();
/// assert_eq!(recorder.entries(), ["outer:load", "outer:save"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingMiddleware {
    label: String,
    entries: Arc<Mutex<Vec<String>>>,
}

impl RecordingMiddleware {
    /// Create a recorder with its own log.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_log(label, Arc::new(Mutex::new(Vec::new())))
    }

    /// Create a recorder writing into a shared log.
    pub fn with_log(label: impl Into<String>, entries: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.into(),
            entries,
        }
    }

    /// Get a clone of the recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Names of the wrapped events, without the label.
    pub fn event_names(&self) -> Vec<String> {
        let prefix = format!("{}:", self.label);
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Get the number of recorded entries.
    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Clear all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Middleware for RecordingMiddleware {
    fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        self.entries
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.label, event.name()));
        next.run(ctx)
    }
}

// ============================================================================
// Counting Event
// ============================================================================

/// An event that counts invocations and always succeeds.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingEvent::new();
/// chain.add_event(ChainableEvent::new("count", counter.clone()))?;
///
/// chain.execute();
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingEvent {
    count: Arc<AtomicUsize>,
}

impl CountingEvent {
    /// Create a new counting event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Event for CountingEvent {
    fn execute(&self, _ctx: &mut EventContext) -> EventResult {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Failing Event
// ============================================================================

/// An event that always fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingEvent {
    code: ErrorCode,
    message: String,
    attempts: Arc<AtomicUsize>,
}

impl FailingEvent {
    /// Fail with [`ErrorCode::EventExecutionFailed`] and `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::EventExecutionFailed, message)
    }

    /// Fail with a specific code.
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times the event ran.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Event for FailingEvent {
    fn execute(&self, _ctx: &mut EventContext) -> EventResult {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EventError::new(self.code, self.message.clone()))
    }
}

// ============================================================================
// Pass-through Middleware
// ============================================================================

/// A middleware that continues inward and does nothing else.
///
/// Useful for measuring or testing layer depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughMiddleware;

impl Middleware for PassthroughMiddleware {
    fn handle(&self, _event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        next.run(ctx)
    }
}

// ============================================================================
// Short-circuit Middleware
// ============================================================================

/// A middleware that returns a fixed outcome without continuing inward.
#[derive(Debug, Clone)]
pub struct ShortCircuitMiddleware {
    outcome: Result<(), EventError>,
}

impl ShortCircuitMiddleware {
    /// Skip the event and report success.
    pub fn succeed() -> Self {
        Self { outcome: Ok(()) }
    }

    /// Skip the event and report a middleware failure.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(EventError::middleware(message)),
        }
    }
}

impl Middleware for ShortCircuitMiddleware {
    fn handle(&self, _event: &ChainableEvent, _ctx: &mut EventContext, _next: Next<'_>) -> EventResult {
        self.outcome.clone()
    }
}
