//! Span instrumentation for events.

use catena_core::{ChainableEvent, EventContext, EventResult, Middleware, Next};

/// A middleware that runs each event inside a `tracing` span.
///
/// The span is named `event_process` and carries the event name and the layer
/// label, so anything logged by inner layers or the event itself is attributed
/// to it. Without the `tracing` feature this is a pass-through.
#[derive(Debug, Clone, Copy)]
pub struct TracingMiddleware {
    label: &'static str,
}

impl TracingMiddleware {
    /// Create a tracing layer with the given label.
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }

    /// The label recorded on every span.
    pub const fn label(&self) -> &'static str {
        self.label
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new("catena")
    }
}

impl Middleware for TracingMiddleware {
    #[cfg(feature = "tracing")]
    fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        let span = ::tracing::info_span!(
            "event_process",
            layer = %self.label,
            event = %event.name(),
            context_entries = ctx.count()
        );
        let _enter = span.enter();
        next.run(ctx)
    }

    #[cfg(not(feature = "tracing"))]
    fn handle(&self, _event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        next.run(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catena_core::{EventMiddleware, compose};
    use std::rc::Rc;

    #[test]
    fn test_runs_inner_event() {
        let layers = [Rc::new(EventMiddleware::new("trace", TracingMiddleware::new("test")))];
        let event = ChainableEvent::from_fn("e", |ctx| {
            ctx.set("ran", true)?;
            Ok(())
        });
        let mut ctx = EventContext::new();

        compose(&event, &layers, &mut ctx).unwrap();
        assert!(*ctx.get::<bool>("ran").unwrap());
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_with_subscriber() {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        ::tracing::subscriber::with_default(subscriber, || {
            let layers = [Rc::new(EventMiddleware::new("trace", TracingMiddleware::default()))];
            let event = ChainableEvent::from_fn("e", |_| Ok(()));
            assert!(compose(&event, &layers, &mut EventContext::new()).is_ok());
        });
    }
}
