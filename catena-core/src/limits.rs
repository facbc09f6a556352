//! Engine limits and execution policy.
//!
//! Every growable structure in Catena has a hard ceiling. The constants below are
//! the defaults; [`Limits`] lets an embedder tighten or relax them per chain.

use crate::error::truncate_utf8;

/// Maximum number of events per chain.
pub const MAX_EVENTS: usize = 1024;

/// Maximum number of middleware layers per chain.
pub const MAX_MIDDLEWARE: usize = 16;

/// Maximum number of context entries.
pub const MAX_CONTEXT_ENTRIES: usize = 512;

/// Maximum accounted context memory in bytes (10 MiB).
pub const MAX_CONTEXT_MEMORY: usize = 10 * 1024 * 1024;

/// Maximum context key length in bytes.
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum event and middleware name length in bytes.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum error message length in bytes.
pub const MAX_ERROR_LENGTH: usize = 1024;

/// Starting capacity of every growable collection.
pub const INITIAL_CAPACITY: usize = 8;

/// Resource ceilings for a chain and its context.
///
/// # Example
///
/// ```rust,ignore
/// let limits = Limits::default()
///     .with_max_context_entries(64)
///     .with_max_context_memory(64 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of events.
    pub max_events: usize,
    /// Maximum number of middleware layers.
    pub max_middleware: usize,
    /// Maximum number of context entries.
    pub max_context_entries: usize,
    /// Maximum accounted context memory in bytes.
    pub max_context_memory: usize,
    /// Maximum key length in bytes.
    pub max_key_length: usize,
    /// Maximum recorded error message length in bytes.
    pub max_error_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_events: MAX_EVENTS,
            max_middleware: MAX_MIDDLEWARE,
            max_context_entries: MAX_CONTEXT_ENTRIES,
            max_context_memory: MAX_CONTEXT_MEMORY,
            max_key_length: MAX_KEY_LENGTH,
            max_error_length: MAX_ERROR_LENGTH,
        }
    }
}

impl Limits {
    /// Set the maximum number of events.
    pub const fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set the maximum number of middleware layers.
    pub const fn with_max_middleware(mut self, max: usize) -> Self {
        self.max_middleware = max;
        self
    }

    /// Set the maximum number of context entries.
    pub const fn with_max_context_entries(mut self, max: usize) -> Self {
        self.max_context_entries = max;
        self
    }

    /// Set the context memory ceiling in bytes.
    pub const fn with_max_context_memory(mut self, max: usize) -> Self {
        self.max_context_memory = max;
        self
    }

    /// Set the maximum key length in bytes.
    pub const fn with_max_key_length(mut self, max: usize) -> Self {
        self.max_key_length = max;
        self
    }

    /// Set the maximum error message length in bytes.
    pub const fn with_max_error_length(mut self, max: usize) -> Self {
        self.max_error_length = max;
        self
    }
}

/// How a chain reacts to a failed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultTolerance {
    /// Any failure stops the chain and the run fails.
    #[default]
    Strict,
    /// Failures are recorded and execution continues.
    Lenient,
    /// Every event is attempted regardless of earlier failures.
    BestEffort,
    /// A registered failure handler decides; without one this behaves as `Strict`.
    Custom,
}

/// How much of an event's error message is kept in the failure log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorDetail {
    /// Keep messages verbatim (development).
    #[default]
    Full,
    /// Replace messages with a generic string (production).
    Minimal,
}

impl ErrorDetail {
    /// Generic message used at [`ErrorDetail::Minimal`].
    pub const GENERIC_MESSAGE: &'static str = "Operation failed";

    /// Produce the message to record for `message` at this detail level.
    pub fn sanitize(self, message: &str) -> String {
        match self {
            ErrorDetail::Minimal => Self::GENERIC_MESSAGE.to_string(),
            ErrorDetail::Full if message.is_empty() => "Unknown error".to_string(),
            ErrorDetail::Full => message.to_string(),
        }
    }

    /// Like [`sanitize`](Self::sanitize), truncated to `max_len` bytes.
    pub fn sanitize_bounded(self, message: &str, max_len: usize) -> String {
        let mut sanitized = self.sanitize(message);
        truncate_utf8(&mut sanitized, max_len);
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_constants() {
        let limits = Limits::default();
        assert_eq!(limits.max_events, 1024);
        assert_eq!(limits.max_middleware, 16);
        assert_eq!(limits.max_context_entries, 512);
        assert_eq!(limits.max_context_memory, 10 * 1024 * 1024);
        assert_eq!(limits.max_key_length, 256);
    }

    #[test]
    fn test_builder_overrides() {
        let limits = Limits::default().with_max_events(4).with_max_middleware(2);
        assert_eq!(limits.max_events, 4);
        assert_eq!(limits.max_middleware, 2);
        assert_eq!(limits.max_context_entries, MAX_CONTEXT_ENTRIES);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(ErrorDetail::Full.sanitize("disk on fire"), "disk on fire");
        assert_eq!(ErrorDetail::Full.sanitize(""), "Unknown error");
        assert_eq!(ErrorDetail::Minimal.sanitize("disk on fire"), "Operation failed");
        assert_eq!(ErrorDetail::Full.sanitize_bounded("disk on fire", 4), "disk");
    }
}
