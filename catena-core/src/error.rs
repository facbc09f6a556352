//! Error types for Catena.
//!
//! This module provides the engine's error vocabulary:
//!
//! - [`ErrorCode`] - The flat, `Copy` taxonomy every failure maps onto
//! - [`ChainError`] - Errors returned by context, registration and value operations
//! - [`EventError`] - The failure payload produced by an event or middleware
//! - [`EventResult`] - What an event body returns

use crate::limits::MAX_ERROR_LENGTH;
use std::fmt;
use thiserror::Error;

/// Typed error codes shared by every engine operation.
///
/// The numeric values are stable and can be surfaced across an FFI or logging
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// No error.
    Success = 0,
    /// A required reference was missing.
    NullPointer,
    /// An argument failed validation.
    InvalidParameter,
    /// An allocation could not be satisfied.
    OutOfMemory,
    /// A bounded collection is full.
    CapacityExceeded,
    /// A context key exceeded the key length limit.
    KeyTooLong,
    /// A name exceeded the name length limit.
    NameTooLong,
    /// The requested entry does not exist.
    NotFound,
    /// Checked arithmetic overflowed.
    Overflow,
    /// An event reported failure.
    EventExecutionFailed,
    /// A middleware layer reported failure.
    MiddlewareFailed,
    /// The chain was mutated or re-entered while executing.
    Reentrancy,
    /// The context memory ceiling would be exceeded.
    MemoryLimitExceeded,
    /// An execution reference failed validation.
    InvalidFunctionReference,
    /// The wall clock could not be converted to a timestamp.
    TimeConversion,
    /// Execution was cancelled between events.
    SignalInterrupted,
}

impl ErrorCode {
    /// Human readable description of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::NullPointer => "NULL pointer",
            ErrorCode::InvalidParameter => "Invalid parameter",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::CapacityExceeded => "Capacity exceeded",
            ErrorCode::KeyTooLong => "Key too long",
            ErrorCode::NameTooLong => "Name too long",
            ErrorCode::NotFound => "Not found",
            ErrorCode::Overflow => "Arithmetic overflow",
            ErrorCode::EventExecutionFailed => "Event execution failed",
            ErrorCode::MiddlewareFailed => "Middleware failed",
            ErrorCode::Reentrancy => "Reentrancy detected",
            ErrorCode::MemoryLimitExceeded => "Memory limit exceeded",
            ErrorCode::InvalidFunctionReference => "Invalid function pointer",
            ErrorCode::TimeConversion => "Time conversion error",
            ErrorCode::SignalInterrupted => "Signal interrupted",
        }
    }

    /// Numeric value of the code.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by engine operations.
///
/// Every variant maps onto exactly one [`ErrorCode`] through [`ChainError::code`].
/// Operations validate before mutating, so an `Err` always means nothing changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// An argument failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A bounded collection is already at its ceiling.
    #[error("{what} capacity exceeded (limit {limit})")]
    CapacityExceeded {
        /// Which collection is full.
        what: &'static str,
        /// The configured ceiling.
        limit: usize,
    },

    /// A context key is longer than the configured maximum.
    #[error("key of {len} bytes exceeds the {max} byte limit")]
    KeyTooLong {
        /// Length of the rejected key.
        len: usize,
        /// The configured maximum.
        max: usize,
    },

    /// No entry exists for the key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Checked arithmetic on a counter or size overflowed.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// The chain is executing and cannot be mutated or re-entered.
    #[error("reentrancy detected: chain is already executing")]
    Reentrancy,

    /// Admitting the entry would push accounted memory past the ceiling.
    #[error("memory limit exceeded: {requested} bytes requested, limit {limit}")]
    MemoryLimitExceeded {
        /// Accounted bytes after the rejected operation.
        requested: usize,
        /// The configured ceiling.
        limit: usize,
    },
}

impl ChainError {
    /// The taxonomy code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ChainError::InvalidParameter(_) => ErrorCode::InvalidParameter,
            ChainError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            ChainError::KeyTooLong { .. } => ErrorCode::KeyTooLong,
            ChainError::NotFound(_) => ErrorCode::NotFound,
            ChainError::Overflow(_) => ErrorCode::Overflow,
            ChainError::Reentrancy => ErrorCode::Reentrancy,
            ChainError::MemoryLimitExceeded { .. } => ErrorCode::MemoryLimitExceeded,
        }
    }
}

/// Failure reported by an event or middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventError {
    code: ErrorCode,
    message: String,
}

impl EventError {
    /// Create an error with an explicit code.
    ///
    /// The message is truncated to [`MAX_ERROR_LENGTH`] bytes.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let mut message = message.into();
        truncate_utf8(&mut message, MAX_ERROR_LENGTH);
        Self { code, message }
    }

    /// An [`ErrorCode::EventExecutionFailed`] error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EventExecutionFailed, message)
    }

    /// An [`ErrorCode::MiddlewareFailed`] error.
    pub fn middleware(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MiddlewareFailed, message)
    }

    /// The error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The error message as reported by the event.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for EventError {}

impl From<ChainError> for EventError {
    fn from(err: ChainError) -> Self {
        EventError::new(err.code(), err.to_string())
    }
}

/// Outcome of a single event or middleware invocation.
pub type EventResult = Result<(), EventError>;

/// Truncate `s` to at most `max` bytes without splitting a character.
pub(crate) fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// Overwrite the bytes of a string before releasing it.
pub(crate) fn scrub(s: &mut String) {
    let mut bytes = std::mem::take(s).into_bytes();
    bytes.fill(0);
    std::hint::black_box(&bytes);
}
