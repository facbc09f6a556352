//! Builder for constructing an [`EventChain`].

use super::{EventChain, FailureHandler};
use catena_core::{
    ChainError, ChainObserver, ChainableEvent, ErrorDetail, EventError, EventMiddleware,
    FaultTolerance, Limits,
};
use std::rc::Rc;

/// Builder for an [`EventChain`].
///
/// Defaults to a strict chain with full messages and default limits.
///
/// ```rust,ignore
/// let chain = EventChain::builder()
///     .fault_tolerance(FaultTolerance::Custom)
///     .failure_handler(|_event, error| error.code() != ErrorCode::MemoryLimitExceeded)
///     .event(ChainableEvent::from_fn("fetch", fetch))
///     .middleware(EventMiddleware::new("timing", TimingMiddleware::new()))
///     .build()?;
/// ```
pub struct ChainBuilder {
    fault_tolerance: FaultTolerance,
    error_detail: ErrorDetail,
    limits: Limits,
    events: Vec<ChainableEvent>,
    middleware: Vec<EventMiddleware>,
    failure_handler: Option<Rc<FailureHandler>>,
    observer: Option<Rc<dyn ChainObserver>>,
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            fault_tolerance: FaultTolerance::default(),
            error_detail: ErrorDetail::default(),
            limits: Limits::default(),
            events: Vec::new(),
            middleware: Vec::new(),
            failure_handler: None,
            observer: None,
        }
    }

    /// Set the failure policy.
    pub fn fault_tolerance(mut self, mode: FaultTolerance) -> Self {
        self.fault_tolerance = mode;
        self
    }

    /// Set the message detail level.
    pub fn error_detail(mut self, detail: ErrorDetail) -> Self {
        self.error_detail = detail;
        self
    }

    /// Override the default limits.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Queue an event.
    pub fn event(mut self, event: ChainableEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Queue a middleware layer.
    pub fn middleware(mut self, middleware: EventMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Set the custom-mode failure handler.
    pub fn failure_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ChainableEvent, &EventError) -> bool + 'static,
    {
        self.failure_handler = Some(Rc::new(handler));
        self
    }

    /// Set the observer.
    pub fn observer(mut self, observer: impl ChainObserver) -> Self {
        self.observer = Some(Rc::new(observer));
        self
    }

    /// Build the chain, registering queued events and middleware in order.
    ///
    /// Fails with the first registration error, e.g. more events than
    /// [`Limits::max_events`] allows.
    pub fn build(self) -> Result<EventChain, ChainError> {
        let chain = EventChain::with_limits(self.fault_tolerance, self.error_detail, self.limits);
        for event in self.events {
            chain.add_event(event)?;
        }
        for middleware in self.middleware {
            chain.use_middleware(middleware)?;
        }
        *chain.failure_handler.borrow_mut() = self.failure_handler;
        *chain.observer.borrow_mut() = self.observer;
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catena_core::ErrorCode;

    #[test]
    fn test_builder_defaults() {
        let chain = ChainBuilder::new().build().unwrap();
        assert_eq!(chain.fault_tolerance(), FaultTolerance::Strict);
        assert_eq!(chain.error_detail(), ErrorDetail::Full);
        assert_eq!(chain.event_count(), 0);
    }

    #[test]
    fn test_builder_registers_in_order() {
        let chain = EventChain::builder()
            .fault_tolerance(FaultTolerance::Lenient)
            .event(ChainableEvent::from_fn("first", |_| Ok(())))
            .event(ChainableEvent::from_fn("second", |_| Ok(())))
            .middleware(EventMiddleware::from_fn("mw", |_e, ctx, next| next.run(ctx)))
            .build()
            .unwrap();

        assert_eq!(chain.event_names(), ["first", "second"]);
        assert_eq!(chain.middleware_names(), ["mw"]);
        assert_eq!(chain.fault_tolerance(), FaultTolerance::Lenient);
    }

    #[test]
    fn test_builder_enforces_limits() {
        let err = EventChain::builder()
            .limits(Limits::default().with_max_events(1))
            .event(ChainableEvent::from_fn("a", |_| Ok(())))
            .event(ChainableEvent::from_fn("b", |_| Ok(())))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CapacityExceeded);
    }

    #[test]
    fn test_builder_installs_handler() {
        let chain = EventChain::builder()
            .fault_tolerance(FaultTolerance::Custom)
            .failure_handler(|_event, _error| true)
            .event(ChainableEvent::from_fn("fails", |_| Err(EventError::failed("boom"))))
            .event(ChainableEvent::from_fn("after", |ctx| {
                ctx.set("after", true)?;
                Ok(())
            }))
            .build()
            .unwrap();

        let result = chain.execute();
        assert!(result.is_success());
        assert_eq!(result.failure_count(), 1);
        assert!(*chain.context().unwrap().get::<bool>("after").unwrap());
    }
}
