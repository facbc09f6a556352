//! Conditional middleware - guard inner layers behind a predicate.

use catena_core::{ChainableEvent, EventContext, EventResult, Middleware, Next};

/// A middleware that continues inward only when a condition holds.
///
/// When the condition is `false` the event and every layer inside this one are
/// skipped and the event counts as successful.
///
/// # Example
///
/// ```rust,ignore
/// // Skip everything once the "dry_run" flag is set.
/// let guard = ConditionalMiddleware::new(|_event, ctx| !ctx.has("dry_run", false));
/// chain.use_middleware(EventMiddleware::new("dry-run guard", guard))?;
/// ```
pub struct ConditionalMiddleware<C> {
    condition: C,
}

impl<C> ConditionalMiddleware<C>
where
    C: Fn(&ChainableEvent, &EventContext) -> bool + 'static,
{
    /// Create a new `ConditionalMiddleware`.
    pub fn new(condition: C) -> Self {
        Self { condition }
    }
}

impl<C> Middleware for ConditionalMiddleware<C>
where
    C: Fn(&ChainableEvent, &EventContext) -> bool + 'static,
{
    fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        if (self.condition)(event, ctx) {
            next.run(ctx)
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(event = event.name(), "event skipped by condition");
            Ok(())
        }
    }
}
