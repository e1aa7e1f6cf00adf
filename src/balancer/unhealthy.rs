//! Set of upstream hosts currently excluded from selection.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

/// Concurrent-safe set of unhealthy host identities.
///
/// Guarded by a single mutex; the lock is only held for set operations,
/// never across I/O. An empty set means no host is out of rotation.
#[derive(Debug, Default)]
pub struct UnhealthyHosts {
    ids: Mutex<HashSet<Uuid>>,
}

impl UnhealthyHosts {
    /// Take a host out of rotation.
    pub fn add(&self, host_id: Uuid) {
        self.lock().insert(host_id);
    }

    /// Return a host to rotation.
    pub fn remove(&self, host_id: Uuid) {
        self.lock().remove(&host_id);
    }

    /// Whether the host is currently out of rotation.
    pub fn is_unhealthy(&self, host_id: Uuid) -> bool {
        self.lock().contains(&host_id)
    }

    /// Number of hosts currently out of rotation.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no host is out of rotation.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        // A poisoned lock only means another session panicked while
        // holding it; the set itself is still valid.
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_membership() {
        let set = UnhealthyHosts::default();
        let id = Uuid::new_v4();

        assert!(!set.is_unhealthy(id));
        assert!(set.is_empty());

        set.add(id);
        assert!(set.is_unhealthy(id));
        assert_eq!(set.len(), 1);

        set.remove(id);
        assert!(!set.is_unhealthy(id));
        assert!(set.is_empty());
    }

    #[test]
    fn adding_twice_is_idempotent() {
        let set = UnhealthyHosts::default();
        let id = Uuid::new_v4();

        set.add(id);
        set.add(id);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn removing_an_absent_id_is_a_no_op() {
        let set = UnhealthyHosts::default();
        set.remove(Uuid::new_v4());
        assert!(set.is_empty());
    }
}
