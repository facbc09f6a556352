//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A lock-free cancellation flag shared between a chain and whoever may stop it.
///
/// The chain polls the token once per event boundary; a running event is never
/// interrupted. The token is `Send + Sync`, so it can be tripped from another
/// thread or from a signal-handling thread.
///
/// # Example
///
/// ```rust,ignore
/// let token = chain.cancellation_token();
/// std::thread::spawn(move || token.cancel());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
