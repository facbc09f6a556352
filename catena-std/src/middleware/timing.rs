//! Per-event wall-clock timing.

use catena_core::{ChainableEvent, EventContext, EventResult, Middleware, Next};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Accumulated timings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingStats {
    /// Sum of all measured durations.
    pub total: Duration,
    /// Number of measured events.
    pub event_count: usize,
    /// Longest single measurement.
    pub max: Duration,
    /// Name of the slowest event.
    pub slowest: Option<String>,
}

impl TimingStats {
    /// Mean duration per event, zero when nothing was measured.
    pub fn average(&self) -> Duration {
        match u32::try_from(self.event_count) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total / n,
        }
    }
}

/// A middleware that measures the time spent inside it for every event.
///
/// Clones share the same totals, so keep a clone to read them after a run:
///
/// ```rust,ignore
/// let timing = TimingMiddleware::new();
/// chain.use_middleware(EventMiddleware::new("timing", timing.clone()))?;
/// chain.execute();
/// println!("{:?}", timing.stats().average());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimingMiddleware {
    stats: Rc<RefCell<TimingStats>>,
}

impl TimingMiddleware {
    /// Create a timer with empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the accumulated totals.
    pub fn stats(&self) -> TimingStats {
        self.stats.borrow().clone()
    }

    /// Total measured time.
    pub fn total(&self) -> Duration {
        self.stats.borrow().total
    }

    /// Number of measured events.
    pub fn event_count(&self) -> usize {
        self.stats.borrow().event_count
    }

    /// Reset the totals.
    pub fn reset(&self) {
        *self.stats.borrow_mut() = TimingStats::default();
    }
}

impl Middleware for TimingMiddleware {
    fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        let started = Instant::now();
        let result = next.run(ctx);
        let elapsed = started.elapsed();

        let mut stats = self.stats.borrow_mut();
        stats.total = stats.total.saturating_add(elapsed);
        stats.event_count = stats.event_count.saturating_add(1);
        if elapsed >= stats.max {
            stats.max = elapsed;
            stats.slowest = Some(event.name().to_string());
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(event = event.name(), elapsed_ns = elapsed.as_nanos() as u64, "event timed");

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catena_core::{EventError, EventMiddleware, compose};

    #[test]
    fn test_counts_every_event_including_failures() {
        let timing = TimingMiddleware::new();
        let layers = [Rc::new(EventMiddleware::new("timing", timing.clone()))];
        let fast = ChainableEvent::from_fn("fast", |_| Ok(()));
        let slow = ChainableEvent::from_fn("slow", |_| {
            std::thread::sleep(Duration::from_millis(5));
            Err(EventError::failed("late"))
        });
        let mut ctx = EventContext::new();

        compose(&fast, &layers, &mut ctx).unwrap();
        assert!(compose(&slow, &layers, &mut ctx).is_err());

        let stats = timing.stats();
        assert_eq!(stats.event_count, 2);
        assert!(stats.total >= Duration::from_millis(5));
        assert_eq!(stats.slowest.as_deref(), Some("slow"));
        assert!(stats.average() <= stats.max);
    }

    #[test]
    fn test_reset() {
        let timing = TimingMiddleware::new();
        let layers = [Rc::new(EventMiddleware::new("timing", timing.clone()))];
        compose(&ChainableEvent::from_fn("e", |_| Ok(())), &layers, &mut EventContext::new())
            .unwrap();
        assert_eq!(timing.event_count(), 1);

        timing.reset();
        assert_eq!(timing.stats(), TimingStats::default());
        assert_eq!(TimingStats::default().average(), Duration::ZERO);
    }
}
