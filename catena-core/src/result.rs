//! Chain execution results.

use crate::error::{ErrorCode, scrub};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFailure {
    /// Name of the failing event, or `"Chain"` for run-level failures.
    pub event_name: String,
    /// Message, already sanitized for the chain's error detail level.
    pub message: String,
    /// Taxonomy code of the failure.
    pub code: ErrorCode,
    /// Unix timestamp in seconds; `0` when the clock could not be read.
    pub timestamp: i64,
}

impl EventFailure {
    /// Record a failure stamped with the current time.
    pub fn now(event_name: impl Into<String>, message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            event_name: event_name.into(),
            message: message.into(),
            code,
            timestamp: unix_timestamp().unwrap_or(0),
        }
    }
}

impl Drop for EventFailure {
    fn drop(&mut self) {
        scrub(&mut self.event_name);
        scrub(&mut self.message);
    }
}

/// Current Unix time in seconds.
///
/// Fails with [`ErrorCode::TimeConversion`] if the clock is before the epoch or
/// does not fit an `i64`.
pub fn unix_timestamp() -> Result<i64, ErrorCode> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ErrorCode::TimeConversion)?;
    i64::try_from(elapsed.as_secs()).map_err(|_| ErrorCode::TimeConversion)
}

/// Outcome of one chain execution.
///
/// `success` is `false` when a strict chain saw a failure, when the run was
/// cancelled or rejected, and `true` for clean runs and for tolerated partial
/// failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResult {
    /// Overall outcome.
    pub success: bool,
    /// Failures in the order they happened.
    pub failures: Vec<EventFailure>,
}

impl ChainResult {
    /// A successful result with room for `capacity` failures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            success: true,
            failures: Vec::with_capacity(capacity),
        }
    }

    /// A failed result carrying a single failure.
    pub fn single_failure(failure: EventFailure) -> Self {
        Self {
            success: false,
            failures: vec![failure],
        }
    }

    /// Whether the run counts as successful.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Recorded failures.
    pub fn failures(&self) -> &[EventFailure] {
        &self.failures
    }

    /// Number of recorded failures.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether the run was stopped by cancellation.
    pub fn was_interrupted(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.code == ErrorCode::SignalInterrupted)
    }
}

impl fmt::Display for ChainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Chain Execution Result ===")?;
        writeln!(f, "Success: {}", if self.success { "YES" } else { "NO" })?;
        writeln!(f, "Failures: {}", self.failures.len())?;
        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failure Details:")?;
            for (i, failure) in self.failures.iter().enumerate() {
                writeln!(f, "  [{}] Event: {}", i + 1, failure.event_name)?;
                writeln!(f, "      Error: {}", failure.message)?;
                writeln!(f, "      Code: {} ({})", failure.code.as_u8(), failure.code)?;
                writeln!(f, "      Time: {}", failure.timestamp)?;
            }
        }
        write!(f, "==============================")
    }
}
