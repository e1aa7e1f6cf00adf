//! Active connection counting for a single upstream host.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks the number of currently open connections to one host.
///
/// All operations are lock-free. Increments and decrements are issued by
/// the session handler around each forwarding task; the selector reads
/// the count concurrently and tolerates a momentarily stale value.
#[derive(Debug, Default)]
pub struct Counter {
    active: AtomicUsize,
}

impl Counter {
    /// Increment the active connection count.
    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the active connection count.
    ///
    /// Uses checked subtraction so an unpaired decrement can never wrap
    /// the counter into a huge positive value.
    pub fn decrement(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}
