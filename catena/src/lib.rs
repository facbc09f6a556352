//! # catena - Ordered Event Pipelines
//!
//! `catena` runs an ordered list of named events against one shared, bounded
//! context. Every event is wrapped by a stack of middleware layers, and a
//! fault-tolerance policy decides whether a failure stops the run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catena::prelude::*;
//!
//! let chain = EventChain::strict_dev();
//! chain.add_event(ChainableEvent::from_fn("add", |ctx| {
//!     let value = *ctx.get::<i64>("value")?;
//!     ctx.set("value", value + 10)?;
//!     Ok(())
//! }))?;
//! chain.use_middleware(EventMiddleware::new("log", LoggingMiddleware::new()))?;
//! chain.context()?.set("value", 42_i64)?;
//!
//! let result = chain.execute();
//! assert!(result.is_success());
//! ```
//!
//! ## Fault tolerance
//!
//! | Mode | On failure |
//! |------|-----------|
//! | [`FaultTolerance::Strict`] | record and stop, run fails |
//! | [`FaultTolerance::Lenient`] | record and continue |
//! | [`FaultTolerance::BestEffort`] | record and continue |
//! | [`FaultTolerance::Custom`] | ask the failure handler |
//!
//! ## Crates
//!
//! - `catena-core`: values, context, events, middleware, results, errors
//! - `catena-std`: the [`EventChain`] orchestrator and standard middleware

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use catena_core::{
    // Cancellation
    CancellationToken,
    // Errors
    ChainError,
    // Instrumentation
    ChainObserver,
    // Results
    ChainResult,
    // Events
    ChainableEvent,
    ErrorCode,
    // Configuration
    ErrorDetail,
    Event,
    // Context
    EventContext,
    EventError,
    EventFailure,
    // Middleware
    EventMiddleware,
    EventResult,
    FaultTolerance,
    // Diagnostics
    Features,
    INITIAL_CAPACITY,
    Limits,
    MAX_CONTEXT_ENTRIES,
    MAX_CONTEXT_MEMORY,
    MAX_ERROR_LENGTH,
    MAX_EVENTS,
    MAX_KEY_LENGTH,
    MAX_MIDDLEWARE,
    MAX_NAME_LENGTH,
    Middleware,
    Next,
    NoopObserver,
    // Values
    RefCountedValue,
    VERSION_MAJOR,
    VERSION_MINOR,
    VERSION_PATCH,
    build_info,
    compose,
    error_string,
    unix_timestamp,
    version,
};

// Orchestration
pub use catena_std::{ChainBuilder, EventChain, FailureHandler};

// Standard middleware and observers
pub use catena_std::middleware::{
    ConditionalMiddleware, LoggingMiddleware, TimingMiddleware, TimingStats, TracingMiddleware,
};
pub use catena_std::observers::{CountingObserver, TracingObserver};

/// Test fixtures.
pub mod testing {
    pub use catena_std::testing::{
        CountingEvent, FailingEvent, PassthroughMiddleware, RecordingMiddleware,
        ShortCircuitMiddleware,
    };
}

/// Common imports for building chains.
pub mod prelude {
    pub use crate::{
        CancellationToken, ChainBuilder, ChainError, ChainObserver, ChainResult, ChainableEvent,
        ConditionalMiddleware, ErrorCode, ErrorDetail, Event, EventChain, EventContext,
        EventError, EventMiddleware, EventResult, FaultTolerance, Limits, LoggingMiddleware,
        Middleware, Next, RefCountedValue, TimingMiddleware, TracingMiddleware,
    };
}
