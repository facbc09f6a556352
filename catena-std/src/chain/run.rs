//! Chain execution.

use super::EventChain;
use catena_core::{
    ChainObserver, ChainResult, ChainableEvent, ErrorCode, EventError, EventFailure,
    FaultTolerance, INITIAL_CAPACITY, compose,
};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Clears the executing flag when a run ends, including by unwinding.
struct ExecutingGuard<'a>(&'a Cell<bool>);

impl<'a> ExecutingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ExecutingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventChain {
    /// Run every event in order through the middleware stack.
    ///
    /// The context persists across runs. Failures are recorded according to the
    /// chain's [`FaultTolerance`] and sanitized according to its
    /// [`ErrorDetail`](catena_core::ErrorDetail).
    ///
    /// A call made while a run is already in flight (from inside an event or
    /// middleware) does not run anything and returns a single `"Chain"` failure
    /// with [`ErrorCode::Reentrancy`].
    pub fn execute(&self) -> ChainResult {
        if self.executing.get() {
            #[cfg(feature = "tracing")]
            tracing::warn!("re-entrant execute rejected");
            return ChainResult::single_failure(self.chain_failure(
                "Chain is already executing",
                ErrorCode::Reentrancy,
            ));
        }
        let Ok(mut ctx) = self.context.try_borrow_mut() else {
            #[cfg(feature = "tracing")]
            tracing::warn!("execute rejected while the context is borrowed");
            return ChainResult::single_failure(self.chain_failure(
                "Context is borrowed by the caller",
                ErrorCode::Reentrancy,
            ));
        };

        let _executing = ExecutingGuard::enter(&self.executing);
        self.interrupted.set(false);
        self.cancel.reset();

        let events: Vec<Rc<ChainableEvent>> = self.events.borrow().clone();
        let layers = self.middleware.borrow().clone();
        let handler = self.failure_handler.borrow().clone();
        let observer = self.observer.borrow().clone();

        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "chain_execute",
            events = events.len(),
            middleware = layers.len(),
            fault_tolerance = ?self.fault_tolerance
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let started = Instant::now();
        let mut result = ChainResult::with_capacity(INITIAL_CAPACITY);
        let mut log = FailureLog {
            result: &mut result,
            bound: self.limits.max_events.saturating_add(1),
            observer: observer.as_deref(),
        };

        if let Some(observer) = &observer {
            observer.on_chain_start(events.len());
        }

        for event in &events {
            if self.cancel.is_cancelled() {
                self.interrupted.set(true);

                #[cfg(feature = "tracing")]
                tracing::info!(next_event = event.name(), "chain execution interrupted");

                log.record(self.chain_failure(
                    "Execution interrupted by signal",
                    ErrorCode::SignalInterrupted,
                ));
                log.result.success = false;
                break;
            }

            if let Some(observer) = &observer {
                observer.on_event_start(event.name());
            }
            let event_started = Instant::now();
            let outcome = compose(event, &layers, &mut ctx);
            if let Some(observer) = &observer {
                observer.on_event_end(event.name(), &outcome, event_started.elapsed());
            }

            let Err(error) = outcome else {
                continue;
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                event = event.name(),
                code = error.code().as_u8(),
                error = %error,
                "event failed"
            );

            log.record(EventFailure::now(
                event.name(),
                self.error_detail
                    .sanitize_bounded(error.message(), self.limits.max_error_length),
                error.code(),
            ));

            if !self.should_continue(handler.as_deref(), event, &error) {
                log.result.success = false;
                break;
            }
        }

        if let Some(observer) = &observer {
            observer.on_chain_end(&result, started.elapsed());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            success = result.success,
            failures = result.failures.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "chain execution finished"
        );

        result
    }

    fn should_continue(
        &self,
        handler: Option<&super::FailureHandler>,
        event: &ChainableEvent,
        error: &EventError,
    ) -> bool {
        match self.fault_tolerance {
            FaultTolerance::Strict => false,
            FaultTolerance::Lenient | FaultTolerance::BestEffort => true,
            FaultTolerance::Custom => handler.is_some_and(|decide| decide(event, error)),
        }
    }
}

/// Appends failures up to a fixed bound.
struct FailureLog<'a> {
    result: &'a mut ChainResult,
    bound: usize,
    observer: Option<&'a dyn ChainObserver>,
}

impl FailureLog<'_> {
    fn record(&mut self, failure: EventFailure) {
        if self.result.failures.len() >= self.bound {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                event = %failure.event_name,
                bound = self.bound,
                "failure log full; failure dropped"
            );
            self.result.success = false;
            return;
        }
        if let Some(observer) = self.observer {
            observer.on_failure(&failure);
        }
        self.result.failures.push(failure);
    }
}
