//! # Middleware
//!
//! Cross-cutting layers composed around every event of a chain.
//!
//! Layers nest like an onion: the last registered middleware is the outermost
//! layer. Each layer receives a [`Next`] continuation and decides whether, and
//! when, to call inward:
//!
//! ```text
//! registered: [A, B, C]
//!
//! C pre -> B pre -> A pre -> event -> A post -> B post -> C post
//! ```
//!
//! A layer that returns without calling [`Next::run`] short-circuits the event and
//! every layer inside it.

use crate::context::EventContext;
use crate::error::{EventResult, scrub};
use crate::event::{ChainableEvent, bounded_name};
use std::fmt;
use std::rc::Rc;

/// A layer wrapped around event execution.
///
/// # Example
///
/// ```rust,ignore
/// struct Audit;
///
/// impl Middleware for Audit {
///     fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
///         ctx.set("last_event", event.name().to_string())?;
///         next.run(ctx)
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Catena `Middleware`",
    label = "missing `Middleware` implementation",
    note = "Implement `Middleware::handle` or pass a closure `Fn(&ChainableEvent, &mut EventContext, Next<'_>) -> EventResult`."
)]
pub trait Middleware: 'static {
    /// Handle one event, calling `next` to continue inward.
    fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>)
    -> EventResult;
}

impl<F> Middleware for F
where
    F: Fn(&ChainableEvent, &mut EventContext, Next<'_>) -> EventResult + 'static,
{
    fn handle(
        &self,
        event: &ChainableEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> EventResult {
        self(event, ctx, next)
    }
}

/// A named middleware layer, ready to be registered on a chain.
pub struct EventMiddleware {
    name: String,
    inner: Box<dyn Middleware>,
}

impl EventMiddleware {
    /// Wrap a [`Middleware`] implementation.
    pub fn new(name: impl Into<String>, middleware: impl Middleware) -> Self {
        Self {
            name: bounded_name(name.into(), "UnnamedMiddleware"),
            inner: Box::new(middleware),
        }
    }

    /// Wrap a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ChainableEvent, &mut EventContext, Next<'_>) -> EventResult + 'static,
    {
        Self::new(name, f)
    }

    /// The middleware name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run this layer.
    pub fn handle(
        &self,
        event: &ChainableEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> EventResult {
        self.inner.handle(event, ctx, next)
    }
}

impl Drop for EventMiddleware {
    fn drop(&mut self) {
        scrub(&mut self.name);
    }
}

impl fmt::Debug for EventMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The continuation handed to a middleware layer.
///
/// Calling [`run`](Self::run) consumes it, so each layer can continue inward at
/// most once.
pub struct Next<'a> {
    event: &'a ChainableEvent,
    layers: &'a [Rc<EventMiddleware>],
}

impl<'a> Next<'a> {
    /// Build the continuation for `event` wrapped by `layers` (registration order).
    pub fn new(event: &'a ChainableEvent, layers: &'a [Rc<EventMiddleware>]) -> Self {
        Self { event, layers }
    }

    /// Invoke the next inner layer, or the event itself once no layers remain.
    pub fn run(self, ctx: &mut EventContext) -> EventResult {
        match self.layers.split_last() {
            Some((outer, inner)) => outer.handle(self.event, ctx, Next::new(self.event, inner)),
            None => self.event.execute(ctx),
        }
    }

    /// The event being wrapped.
    pub fn event(&self) -> &'a ChainableEvent {
        self.event
    }

    /// Number of layers still to run before the event.
    pub fn remaining(&self) -> usize {
        self.layers.len()
    }
}

/// Run `event` through `layers`, outermost (last registered) first.
pub fn compose(
    event: &ChainableEvent,
    layers: &[Rc<EventMiddleware>],
    ctx: &mut EventContext,
) -> EventResult {
    Next::new(event, layers).run(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, EventError};
    use std::cell::RefCell;

    fn tracer(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Rc<EventMiddleware> {
        let log = Rc::clone(log);
        Rc::new(EventMiddleware::from_fn(name, move |_event, ctx, next| {
            log.borrow_mut().push(format!("{name}:pre"));
            let result = next.run(ctx);
            log.borrow_mut().push(format!("{name}:post"));
            result
        }))
    }

    #[test]
    fn test_no_layers_runs_event() {
        let event = ChainableEvent::from_fn("e", |ctx| {
            ctx.set("ran", true)?;
            Ok(())
        });
        let mut ctx = EventContext::new();
        compose(&event, &[], &mut ctx).unwrap();
        assert!(*ctx.get::<bool>("ran").unwrap());
    }

    #[test]
    fn test_onion_order_is_lifo() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let layers = vec![tracer(&log, "a"), tracer(&log, "b"), tracer(&log, "c")];
        let event_log = Rc::clone(&log);
        let event = ChainableEvent::from_fn("e", move |_| {
            event_log.borrow_mut().push("event".into());
            Ok(())
        });

        compose(&event, &layers, &mut EventContext::new()).unwrap();
        assert_eq!(
            *log.borrow(),
            ["c:pre", "b:pre", "a:pre", "event", "a:post", "b:post", "c:post"]
        );
    }

    #[test]
    fn test_short_circuit_skips_inner_layers_and_event() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let gate = Rc::new(EventMiddleware::from_fn("gate", |_event, _ctx, _next| {
            Err(EventError::middleware("denied"))
        }));
        let layers = vec![tracer(&log, "inner"), gate];
        let event_log = Rc::clone(&log);
        let event = ChainableEvent::from_fn("e", move |_| {
            event_log.borrow_mut().push("event".into());
            Ok(())
        });

        let err = compose(&event, &layers, &mut EventContext::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MiddlewareFailed);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_layer_can_rewrite_result() {
        let recover = Rc::new(EventMiddleware::from_fn("recover", |_event, ctx, next| {
            next.run(ctx).or_else(|_| Ok(()))
        }));
        let event = ChainableEvent::from_fn("e", |_| Err(EventError::failed("nope")));
        assert!(compose(&event, &[recover], &mut EventContext::new()).is_ok());
    }

    #[test]
    fn test_next_reports_event_and_depth() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let probe = Rc::new(EventMiddleware::from_fn("probe", move |_event, ctx, next| {
            *sink.borrow_mut() = Some((next.event().name().to_string(), next.remaining()));
            next.run(ctx)
        }));
        let passthrough = Rc::new(EventMiddleware::from_fn("pass", |_e, ctx, next| next.run(ctx)));
        let event = ChainableEvent::from_fn("target", |_| Ok(()));

        compose(&event, &[passthrough, probe], &mut EventContext::new()).unwrap();
        assert_eq!(*seen.borrow(), Some(("target".to_string(), 1)));
    }
}
