//! # Events
//!
//! An event is one named unit of work in a chain. It reads and writes the shared
//! [`EventContext`] and reports success or an [`EventError`](crate::EventError).
//!
//! Any `Fn(&mut EventContext) -> EventResult` is an [`Event`]; implement the trait
//! directly when the unit of work carries its own state.

use crate::context::EventContext;
use crate::error::{EventResult, scrub, truncate_utf8};
use crate::limits::MAX_NAME_LENGTH;
use std::fmt;

/// A unit of work executed as one step of a chain.
///
/// # Example
///
/// ```rust,ignore
/// struct AddTen;
///
/// impl Event for AddTen {
///     fn execute(&self, ctx: &mut EventContext) -> EventResult {
///         let value = *ctx.get::<i64>("value")?;
///         ctx.set("value", value + 10)?;
///         Ok(())
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Catena `Event`",
    label = "missing `Event` implementation",
    note = "Implement `Event::execute` or pass a closure `Fn(&mut EventContext) -> EventResult`."
)]
pub trait Event: 'static {
    /// Run the event against the shared context.
    fn execute(&self, ctx: &mut EventContext) -> EventResult;
}

impl<F> Event for F
where
    F: Fn(&mut EventContext) -> EventResult + 'static,
{
    fn execute(&self, ctx: &mut EventContext) -> EventResult {
        self(ctx)
    }
}

/// A named event, ready to be registered on a chain.
///
/// Names longer than [`MAX_NAME_LENGTH`] bytes are truncated; an empty name
/// becomes `"UnnamedEvent"`.
pub struct ChainableEvent {
    name: String,
    inner: Box<dyn Event>,
}

impl ChainableEvent {
    /// Wrap an [`Event`] implementation.
    pub fn new(name: impl Into<String>, event: impl Event) -> Self {
        Self {
            name: bounded_name(name.into(), "UnnamedEvent"),
            inner: Box::new(event),
        }
    }

    /// Wrap a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut EventContext) -> EventResult + 'static,
    {
        Self::new(name, f)
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the event directly, bypassing any middleware.
    pub fn execute(&self, ctx: &mut EventContext) -> EventResult {
        self.inner.execute(ctx)
    }
}

impl Drop for ChainableEvent {
    fn drop(&mut self) {
        scrub(&mut self.name);
    }
}

impl fmt::Debug for ChainableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainableEvent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Apply the name rules shared by events and middleware.
pub(crate) fn bounded_name(mut name: String, fallback: &str) -> String {
    if name.is_empty() {
        return fallback.to_string();
    }
    truncate_utf8(&mut name, MAX_NAME_LENGTH);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, EventError};

    struct SetFlag;

    impl Event for SetFlag {
        fn execute(&self, ctx: &mut EventContext) -> EventResult {
            ctx.set("flag", true)?;
            Ok(())
        }
    }

    #[test]
    fn test_struct_event() {
        let event = ChainableEvent::new("set_flag", SetFlag);
        let mut ctx = EventContext::new();
        event.execute(&mut ctx).unwrap();
        assert!(*ctx.get::<bool>("flag").unwrap());
        assert_eq!(event.name(), "set_flag");
    }

    #[test]
    fn test_closure_event_failure() {
        let event = ChainableEvent::from_fn("boom", |_ctx| Err(EventError::failed("boom")));
        let err = event.execute(&mut EventContext::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EventExecutionFailed);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn test_question_mark_on_context_errors() {
        let event = ChainableEvent::from_fn("read", |ctx| {
            ctx.get::<i64>("missing")?;
            Ok(())
        });
        let err = event.execute(&mut EventContext::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_names_are_truncated_not_rejected() {
        let event = ChainableEvent::from_fn("n".repeat(300), |_| Ok(()));
        assert_eq!(event.name().len(), MAX_NAME_LENGTH);

        let unnamed = ChainableEvent::from_fn("", |_| Ok(()));
        assert_eq!(unnamed.name(), "UnnamedEvent");
    }
}
