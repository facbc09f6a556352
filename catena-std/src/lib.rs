//! # catena-std
//!
//! Standard implementations for the Catena event chain engine.
//!
//! This crate provides:
//! - **Orchestration**: [`EventChain`], [`ChainBuilder`]
//! - **Standard middleware**: Logging, Tracing, Timing, Conditional
//! - **Standard observers**: [`TracingObserver`](observers::TracingObserver),
//!   [`CountingObserver`](observers::CountingObserver)
//! - **Test fixtures**: the [`testing`] module

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use catena_core;

// Modules
pub mod chain;
pub mod middleware;
pub mod observers;
pub mod testing;

pub use chain::{ChainBuilder, EventChain, FailureHandler};
