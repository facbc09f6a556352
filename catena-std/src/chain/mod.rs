//! The event chain orchestrator.
//!
//! An [`EventChain`] owns its events, middleware and context, and moves between
//! two states:
//!
//! - **Idle**: registration and context access are allowed
//! - **Executing**: one run is in flight; registration, context access and a
//!   second `execute` are rejected with [`ChainError::Reentrancy`]
//!
//! The chain is single-threaded. State lives behind `Cell`/`RefCell` so that code
//! running inside an event that holds a handle to the chain gets a typed error
//! instead of a borrow panic. Only the [`CancellationToken`] crosses threads.

mod builder;
mod run;

pub use builder::ChainBuilder;

use catena_core::{
    CancellationToken, ChainError, ChainObserver, ChainableEvent, ErrorCode, ErrorDetail,
    EventContext, EventError, EventFailure, EventMiddleware, FaultTolerance, INITIAL_CAPACITY,
    Limits,
};
use std::cell::{Cell, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Decides, in [`FaultTolerance::Custom`] mode, whether a run continues after a
/// failed event.
pub type FailureHandler = dyn Fn(&ChainableEvent, &EventError) -> bool;

/// An ordered pipeline of events wrapped by middleware, sharing one context.
///
/// # Example
///
/// ```rust,ignore
/// let chain = EventChain::lenient();
/// chain.add_event(ChainableEvent::from_fn("load", load))?;
/// chain.add_event(ChainableEvent::from_fn("save", save))?;
/// chain.use_middleware(EventMiddleware::new("log", LoggingMiddleware::new()))?;
/// chain.context()?.set("path", "/tmp/in")?;
///
/// let result = chain.execute();
/// println!("{result}");
/// ```
pub struct EventChain {
    events: RefCell<Vec<Rc<ChainableEvent>>>,
    event_capacity: Cell<usize>,
    middleware: RefCell<Vec<Rc<EventMiddleware>>>,
    middleware_capacity: Cell<usize>,
    context: RefCell<EventContext>,
    fault_tolerance: FaultTolerance,
    error_detail: ErrorDetail,
    limits: Limits,
    failure_handler: RefCell<Option<Rc<FailureHandler>>>,
    observer: RefCell<Option<Rc<dyn ChainObserver>>>,
    executing: Cell<bool>,
    interrupted: Cell<bool>,
    cancel: CancellationToken,
}

impl EventChain {
    /// Create a chain with default limits.
    pub fn new(fault_tolerance: FaultTolerance, error_detail: ErrorDetail) -> Self {
        Self::with_limits(fault_tolerance, error_detail, Limits::default())
    }

    /// Create a chain with explicit limits.
    pub fn with_limits(
        fault_tolerance: FaultTolerance,
        error_detail: ErrorDetail,
        limits: Limits,
    ) -> Self {
        let cancel = CancellationToken::new();
        let event_capacity = INITIAL_CAPACITY.min(limits.max_events);
        let middleware_capacity = INITIAL_CAPACITY.min(limits.max_middleware);
        Self {
            events: RefCell::new(Vec::with_capacity(event_capacity)),
            event_capacity: Cell::new(event_capacity),
            middleware: RefCell::new(Vec::with_capacity(middleware_capacity)),
            middleware_capacity: Cell::new(middleware_capacity),
            context: RefCell::new(
                EventContext::with_limits(limits).with_cancellation(cancel.clone()),
            ),
            fault_tolerance,
            error_detail,
            limits,
            failure_handler: RefCell::new(None),
            observer: RefCell::new(None),
            executing: Cell::new(false),
            interrupted: Cell::new(false),
            cancel,
        }
    }

    /// A configurable builder.
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Strict chain with sanitized messages (production defaults).
    pub fn strict() -> Self {
        Self::new(FaultTolerance::Strict, ErrorDetail::Minimal)
    }

    /// Strict chain with full messages (development defaults).
    pub fn strict_dev() -> Self {
        Self::new(FaultTolerance::Strict, ErrorDetail::Full)
    }

    /// Lenient chain with full messages.
    pub fn lenient() -> Self {
        Self::new(FaultTolerance::Lenient, ErrorDetail::Full)
    }

    /// Best-effort chain with full messages.
    pub fn best_effort() -> Self {
        Self::new(FaultTolerance::BestEffort, ErrorDetail::Full)
    }

    /// Custom-policy chain with full messages; see [`set_failure_handler`](Self::set_failure_handler).
    pub fn custom() -> Self {
        Self::new(FaultTolerance::Custom, ErrorDetail::Full)
    }

    /// Append an event. Events run in registration order.
    pub fn add_event(&self, event: ChainableEvent) -> Result<(), ChainError> {
        self.ensure_idle()?;
        let mut events = self
            .events
            .try_borrow_mut()
            .map_err(|_| ChainError::Reentrancy)?;
        reserve_slot(
            &mut events,
            &self.event_capacity,
            self.limits.max_events,
            "event",
        )?;

        #[cfg(feature = "tracing")]
        tracing::trace!(event = event.name(), position = events.len(), "event registered");

        events.push(Rc::new(event));
        Ok(())
    }

    /// Add a middleware layer. The most recently added layer is the outermost.
    pub fn use_middleware(&self, middleware: EventMiddleware) -> Result<(), ChainError> {
        self.ensure_idle()?;
        let mut layers = self
            .middleware
            .try_borrow_mut()
            .map_err(|_| ChainError::Reentrancy)?;
        reserve_slot(
            &mut layers,
            &self.middleware_capacity,
            self.limits.max_middleware,
            "middleware",
        )?;

        #[cfg(feature = "tracing")]
        tracing::trace!(middleware = middleware.name(), depth = layers.len() + 1, "middleware registered");

        layers.push(Rc::new(middleware));
        Ok(())
    }

    /// Install the predicate consulted in [`FaultTolerance::Custom`] mode.
    ///
    /// It receives the failed event and its unsanitized error and returns `true`
    /// to continue with the next event.
    pub fn set_failure_handler<F>(&self, handler: F) -> Result<(), ChainError>
    where
        F: Fn(&ChainableEvent, &EventError) -> bool + 'static,
    {
        self.ensure_idle()?;
        *self
            .failure_handler
            .try_borrow_mut()
            .map_err(|_| ChainError::Reentrancy)? = Some(Rc::new(handler));
        Ok(())
    }

    /// Install an observer notified during every run.
    pub fn set_observer(&self, observer: impl ChainObserver) -> Result<(), ChainError> {
        self.ensure_idle()?;
        *self
            .observer
            .try_borrow_mut()
            .map_err(|_| ChainError::Reentrancy)? = Some(Rc::new(observer));
        Ok(())
    }

    /// Borrow the chain's context for seeding or inspection.
    ///
    /// Fails with [`ChainError::Reentrancy`] while a run is in flight; events
    /// receive the context directly instead.
    pub fn context(&self) -> Result<RefMut<'_, EventContext>, ChainError> {
        self.ensure_idle()?;
        self.context
            .try_borrow_mut()
            .map_err(|_| ChainError::Reentrancy)
    }

    /// A handle that cancels the current run at the next event boundary.
    ///
    /// Each run clears the token when it starts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the most recent run was stopped by cancellation.
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.get()
    }

    /// Whether a run is in flight.
    pub fn is_executing(&self) -> bool {
        self.executing.get()
    }

    /// Number of registered events.
    pub fn event_count(&self) -> usize {
        self.events.borrow().len()
    }

    /// Number of registered middleware layers.
    pub fn middleware_count(&self) -> usize {
        self.middleware.borrow().len()
    }

    /// Allocated event slots.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity.get()
    }

    /// Allocated middleware slots.
    pub fn middleware_capacity(&self) -> usize {
        self.middleware_capacity.get()
    }

    /// Event names in execution order.
    pub fn event_names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Middleware names in registration order (innermost first).
    pub fn middleware_names(&self) -> Vec<String> {
        self.middleware
            .borrow()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// The failure policy.
    pub fn fault_tolerance(&self) -> FaultTolerance {
        self.fault_tolerance
    }

    /// The message detail level recorded in failures.
    pub fn error_detail(&self) -> ErrorDetail {
        self.error_detail
    }

    /// The limits this chain enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn ensure_idle(&self) -> Result<(), ChainError> {
        if self.executing.get() {
            #[cfg(feature = "tracing")]
            tracing::warn!("chain mutation rejected while executing");
            return Err(ChainError::Reentrancy);
        }
        Ok(())
    }

    /// A run-level failure attributed to the chain itself.
    fn chain_failure(&self, message: &str, code: ErrorCode) -> EventFailure {
        EventFailure::now(
            "Chain",
            self.error_detail
                .sanitize_bounded(message, self.limits.max_error_length),
            code,
        )
    }
}

impl Default for EventChain {
    fn default() -> Self {
        Self::strict_dev()
    }
}

impl fmt::Debug for EventChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChain")
            .field("events", &self.event_names())
            .field("middleware", &self.middleware_names())
            .field("fault_tolerance", &self.fault_tolerance)
            .field("error_detail", &self.error_detail)
            .field("executing", &self.executing.get())
            .finish_non_exhaustive()
    }
}

/// Make room for one more item, doubling capacity up to `limit`.
fn reserve_slot<T>(
    items: &mut Vec<T>,
    capacity: &Cell<usize>,
    limit: usize,
    what: &'static str,
) -> Result<(), ChainError> {
    if items.len() >= limit {
        #[cfg(feature = "tracing")]
        tracing::warn!(what, limit, "registration limit reached");
        return Err(ChainError::CapacityExceeded { what, limit });
    }
    if items.len() < capacity.get() {
        return Ok(());
    }
    let grown = capacity
        .get()
        .max(1)
        .checked_mul(2)
        .ok_or(ChainError::Overflow("registration capacity"))?
        .min(limit);
    items.reserve_exact(grown - items.len());
    capacity.set(grown);
    Ok(())
}
