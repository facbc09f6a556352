//! Logging middleware for event observation.

use catena_core::{ChainableEvent, EventContext, EventResult, Middleware, Next};

/// A middleware that logs each event's outcome.
///
/// Without the `tracing` feature it passes events through untouched.
#[derive(Debug, Clone, Copy)]
pub struct LoggingMiddleware {
    log_success: bool,
    log_failure: bool,
}

impl LoggingMiddleware {
    /// Log successes and failures.
    pub const fn new() -> Self {
        Self {
            log_success: true,
            log_failure: true,
        }
    }

    /// Log failures only.
    pub const fn errors_only() -> Self {
        Self {
            log_success: false,
            log_failure: true,
        }
    }

    /// Whether successful events are logged.
    pub const fn logs_success(&self) -> bool {
        self.log_success
    }

    /// Whether failed events are logged.
    pub const fn logs_failure(&self) -> bool {
        self.log_failure
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&self, event: &ChainableEvent, ctx: &mut EventContext, next: Next<'_>) -> EventResult {
        #[cfg(feature = "tracing")]
        {
            if self.log_success {
                tracing::debug!(event = event.name(), "executing event");
            }
        }

        let result = next.run(ctx);

        #[cfg(feature = "tracing")]
        {
            match &result {
                Ok(()) if self.log_success => {
                    tracing::info!(event = event.name(), "event succeeded");
                }
                Err(error) if self.log_failure => {
                    tracing::warn!(
                        event = event.name(),
                        code = error.code().as_u8(),
                        error = %error,
                        "event failed"
                    );
                }
                _ => {}
            }
        }
        #[cfg(not(feature = "tracing"))]
        {
            let _ = event;
        }

        result
    }
}
