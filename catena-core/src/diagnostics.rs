//! Version and build diagnostics.

use crate::limits::{MAX_CONTEXT_MEMORY, MAX_MIDDLEWARE};
use bitflags::bitflags;
use std::fmt::Write;

/// Engine contract version, major component.
pub const VERSION_MAJOR: u32 = 3;
/// Engine contract version, minor component.
pub const VERSION_MINOR: u32 = 1;
/// Engine contract version, patch component.
pub const VERSION_PATCH: u32 = 0;

bitflags! {
    /// Capabilities compiled into this build.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Context values are reference counted with exactly-once cleanup.
        const REFCOUNTED_VALUES = 1 << 0;
        /// `has` supports a constant-time scan.
        const CONSTANT_TIME_LOOKUP = 1 << 1;
        /// Entry and memory ceilings on the context.
        const MEMORY_LIMITS = 1 << 2;
        /// Onion-composed middleware with short-circuiting.
        const ONION_MIDDLEWARE = 1 << 3;
        /// Registration and execution are rejected while a run is in flight.
        const REENTRANCY_GUARD = 1 << 4;
        /// Runs stop cleanly at event boundaries when cancelled.
        const COOPERATIVE_CANCELLATION = 1 << 5;
        /// Failure messages are sanitized by detail level.
        const ERROR_SANITIZATION = 1 << 6;
        /// Keys, names and messages are zeroed before release.
        const SECURE_SCRUB = 1 << 7;
        /// Structured logging through `tracing`.
        const TRACING = 1 << 8;
    }
}

impl Features {
    /// The capabilities of the running build.
    pub fn enabled() -> Self {
        let features = Features::all().difference(Features::TRACING);
        if cfg!(feature = "tracing") {
            features | Features::TRACING
        } else {
            features
        }
    }
}

/// The engine version as `major.minor.patch`.
pub fn version() -> String {
    format!("{VERSION_MAJOR}.{VERSION_MINOR}.{VERSION_PATCH}")
}

/// A multi-line summary of the build and its capabilities.
pub fn build_info() -> String {
    let mut info = format!("Catena v{} - event chain engine\n", version());
    info.push_str("Limits:\n");
    let _ = writeln!(info, "  - context memory: {} MB", MAX_CONTEXT_MEMORY / (1024 * 1024));
    let _ = writeln!(info, "  - middleware layers: {MAX_MIDDLEWARE}");
    info.push_str("Features:");
    for (name, _) in Features::enabled().iter_names() {
        let _ = write!(info, "\n  - {}", name.to_lowercase().replace('_', " "));
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "3.1.0");
    }

    #[test]
    fn test_build_info_lists_features() {
        let info = build_info();
        assert!(info.starts_with("Catena v3.1.0"));
        assert!(info.contains("context memory: 10 MB"));
        assert!(info.contains("middleware layers: 16"));
        assert!(info.contains("constant time lookup"));
        assert_eq!(info.contains("tracing"), cfg!(feature = "tracing"));
    }

    #[test]
    fn test_enabled_features() {
        let features = Features::enabled();
        assert!(features.contains(Features::REENTRANCY_GUARD | Features::ONION_MIDDLEWARE));
        assert_eq!(features.contains(Features::TRACING), cfg!(feature = "tracing"));
    }
}
