//! Standard middleware layers.
//!
//! - [`LoggingMiddleware`]: logs each event's outcome
//! - [`TracingMiddleware`]: runs each event inside a span
//! - [`TimingMiddleware`]: accumulates per-event wall-clock time
//! - [`ConditionalMiddleware`]: guards inner layers behind a predicate

mod conditional;
mod logging;
mod timing;
mod tracing;

pub use conditional::ConditionalMiddleware;
pub use logging::LoggingMiddleware;
pub use timing::{TimingMiddleware, TimingStats};
pub use self::tracing::TracingMiddleware;
