//! Passive health tracking for a single upstream host.
//!
//! # Responsibilities
//! - Count consecutive failed dial attempts
//! - Reset the count on any successful dial
//! - Answer whether the host currently shows healthy
//!
//! # Design Decisions
//! - Consecutive failures rather than a windowed rate: dial outcome is
//!   the only signal at L4, and a single transient failure should not
//!   evict a host
//! - Failures are counted in the same code path that uses the host, so
//!   no separate probe can disagree with real traffic

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of consecutive dial failures tolerated before a host stops
/// showing healthy.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Tracks consecutive dial failures against a fixed threshold.
#[derive(Debug)]
pub struct Tracker {
    /// Failures since the last successful dial.
    consecutive_failures: AtomicU32,

    /// Immutable threshold; the host shows healthy while
    /// `consecutive_failures <= failures_threshold`.
    failures_threshold: u32,
}

impl Tracker {
    /// Create a tracker with the given failure threshold.
    pub fn new(failures_threshold: u32) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            failures_threshold,
        }
    }

    /// Record a failed dial attempt.
    pub fn track_failure(&self) {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful dial, resetting the consecutive failure count.
    pub fn track_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Whether the host shows healthy based on the most recent dial outcomes.
    pub fn shows_healthy(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) <= self.failures_threshold
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}
