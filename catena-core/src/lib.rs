//! # catena-core
//!
//! Core types for the Catena event chain engine.
//!
//! This crate has minimal dependencies and holds everything an event or
//! middleware author needs; the orchestrator lives in `catena-std`.
//!
//! # Building Blocks
//!
//! ## Values ([`RefCountedValue`])
//!
//! Shared ownership for context values, with a cleanup callback that runs exactly
//! once when the last handle is released.
//!
//! ## Context ([`EventContext`])
//!
//! The bounded, ordered key/value store every event of a run reads and writes.
//! Entry count and accounted memory are checked before any mutation.
//!
//! ## Events ([`Event`], [`ChainableEvent`])
//!
//! Named units of work. Any `Fn(&mut EventContext) -> EventResult` is an event.
//!
//! ## Middleware ([`Middleware`], [`EventMiddleware`], [`Next`])
//!
//! Layers composed around each event in LIFO registration order. A layer may act
//! before and after calling inward, rewrite the result, or not call inward at all.
//!
//! ## Results ([`ChainResult`], [`EventFailure`])
//!
//! The ordered failure log of one run plus its overall outcome.
//!
//! # Error Types
//!
//! - [`ErrorCode`] - Flat taxonomy of every failure
//! - [`ChainError`] - Errors from engine operations
//! - [`EventError`] - Failures reported by events and middleware

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod cancel;
mod context;
mod diagnostics;
mod error;
mod event;
mod limits;
mod middleware;
mod observer;
mod result;
mod value;

// Re-exports
pub use cancel::CancellationToken;
pub use context::{ENTRY_OVERHEAD, EventContext, SLOT_BYTES};
pub use diagnostics::{
    Features, VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH, build_info, version,
};
pub use error::{ChainError, ErrorCode, EventError, EventResult};
pub use event::{ChainableEvent, Event};
pub use limits::{
    ErrorDetail, FaultTolerance, INITIAL_CAPACITY, Limits, MAX_CONTEXT_ENTRIES,
    MAX_CONTEXT_MEMORY, MAX_ERROR_LENGTH, MAX_EVENTS, MAX_KEY_LENGTH, MAX_MIDDLEWARE,
    MAX_NAME_LENGTH,
};
pub use middleware::{EventMiddleware, Middleware, Next, compose};
pub use observer::{ChainObserver, NoopObserver};
pub use result::{ChainResult, EventFailure, unix_timestamp};
pub use value::RefCountedValue;

/// Human readable description of an error code.
pub fn error_string(code: ErrorCode) -> &'static str {
    code.as_str()
}
