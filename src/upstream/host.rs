//! Upstream host representation and dialing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use uuid::Uuid;

use crate::net::resolver::{self, NetworkFamily, ResolveError};
use crate::upstream::connections::Counter;
use crate::upstream::health::Tracker;

/// Upper bound on a single connect attempt. A connect that takes longer
/// counts as a dial failure.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for host construction.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HostError(#[from] ResolveError);

/// Error type for dialing a host.
#[derive(Debug, thiserror::Error)]
pub enum DialError {
    /// The dial failed and pushed the host past its failure threshold.
    /// The caller should take the host out of rotation and retry
    /// selection.
    #[error("host is unhealthy")]
    Unhealthy,

    /// The dial failed but the host still shows healthy.
    #[error("unable to connect to host: {0}")]
    Connect(#[source] std::io::Error),
}

/// An upstream host the balancer can forward client sessions to.
///
/// Each host exclusively owns its active-connection counter and failure
/// tracker. The balancer holds hosts behind `Arc` so that in-flight
/// sessions can outlive eviction from rotation.
#[derive(Debug)]
pub struct TcpHost {
    /// Unique identifier; the key used by the unhealthy set.
    id: Uuid,

    /// Resolved remote address.
    address: SocketAddr,

    /// Network family this host was resolved under.
    network: NetworkFamily,

    /// Number of open forwarded connections to this host.
    active_connections: Counter,

    /// Consecutive dial failure tracking.
    health: Tracker,
}

impl TcpHost {
    /// Create a host from an address string, resolving it immediately.
    ///
    /// Resolution failure (or no address of the requested family) aborts
    /// construction.
    pub fn new(
        address: &str,
        network: NetworkFamily,
        failures_threshold: u32,
    ) -> Result<Self, HostError> {
        let resolved = resolver::resolve(address, network)?;

        Ok(Self {
            id: Uuid::new_v4(),
            address: resolved,
            network,
            active_connections: Counter::default(),
            health: Tracker::new(failures_threshold),
        })
    }

    /// The host's identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The host's resolved remote address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The network family the host was resolved under.
    pub fn network(&self) -> NetworkFamily {
        self.network
    }

    /// Number of currently active forwarded connections.
    pub fn connection_count(&self) -> usize {
        self.active_connections.count()
    }

    /// Whether the host shows healthy. Does not attempt a connection;
    /// `dial` is the only place health state changes.
    pub fn shows_healthy(&self) -> bool {
        self.health.shows_healthy()
    }

    /// Increment the active connection count, returning a guard that
    /// decrements it exactly once when dropped.
    pub fn track_connection(self: &Arc<Self>) -> ConnectionGuard {
        self.active_connections.increment();
        ConnectionGuard {
            host: Arc::clone(self),
        }
    }

    /// Open a TCP connection to the host.
    ///
    /// A successful connect resets the failure tracker. A failed connect
    /// (including a connect timeout) increments it; if the host no longer
    /// shows healthy the distinguished `Unhealthy` error is returned so
    /// the caller can evict the host and retry selection.
    pub async fn dial(&self) -> Result<TcpStream, DialError> {
        let attempt = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(self.address)).await;

        let error = match attempt {
            Ok(Ok(stream)) => {
                self.health.track_success();
                return Ok(stream);
            }
            Ok(Err(e)) => e,
            Err(_) => std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
        };

        tracing::warn!(host = %self.address, error = %error, "error dialing host");

        self.health.track_failure();
        if !self.health.shows_healthy() {
            return Err(DialError::Unhealthy);
        }
        Err(DialError::Connect(error))
    }
}

/// RAII guard pairing one counter increment with exactly one decrement.
///
/// Created by [`TcpHost::track_connection`]; dropped by the session
/// handler on every exit path, including early dial errors.
#[derive(Debug)]
pub struct ConnectionGuard {
    host: Arc<TcpHost>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.host.active_connections.decrement();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn construction_resolves_the_address() {
        let host = TcpHost::new("127.0.0.1:9000", NetworkFamily::Tcp, 3).unwrap();
        assert_eq!(host.address().port(), 9000);
        assert_eq!(host.network(), NetworkFamily::Tcp);
        assert_eq!(host.connection_count(), 0);
        assert!(host.shows_healthy());
    }

    #[test]
    fn construction_fails_on_unresolvable_address() {
        assert!(TcpHost::new("not an address", NetworkFamily::Tcp, 3).is_err());
    }

    #[test]
    fn construction_fails_on_family_mismatch() {
        assert!(TcpHost::new("127.0.0.1:9000", NetworkFamily::Tcp6, 3).is_err());
    }

    #[test]
    fn hosts_get_distinct_ids() {
        let a = TcpHost::new("127.0.0.1:9000", NetworkFamily::Tcp, 3).unwrap();
        let b = TcpHost::new("127.0.0.1:9000", NetworkFamily::Tcp, 3).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn guard_decrements_on_drop() {
        let host = Arc::new(TcpHost::new("127.0.0.1:9000", NetworkFamily::Tcp, 3).unwrap());

        let guard = host.track_connection();
        assert_eq!(host.connection_count(), 1);

        drop(guard);
        assert_eq!(host.connection_count(), 0);
    }

    /// Bind a listener to reserve a port, then drop it so connects to
    /// that port are refused.
    async fn dead_address() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test]
    async fn dial_success_resets_failures() {
        let addr = dead_address().await;
        let host = TcpHost::new(&addr.to_string(), NetworkFamily::Tcp, 3).unwrap();

        assert!(matches!(host.dial().await, Err(DialError::Connect(_))));
        assert!(matches!(host.dial().await, Err(DialError::Connect(_))));

        // The host comes back: rebind the reserved port and dial again.
        let _listener = TcpListener::bind(addr).await.unwrap();
        assert!(host.dial().await.is_ok());
        assert!(host.shows_healthy());

        // The reset means a later failure starts the count over.
        drop(_listener);
        assert!(matches!(host.dial().await, Err(DialError::Connect(_))));
        assert!(host.shows_healthy());
    }

    #[tokio::test]
    async fn repeated_dial_failures_become_unhealthy() {
        let addr = dead_address().await;
        let host = TcpHost::new(&addr.to_string(), NetworkFamily::Tcp, 1).unwrap();

        // First failure stays within the threshold and surfaces the
        // underlying connect error.
        match host.dial().await {
            Err(DialError::Connect(_)) => {}
            other => panic!("expected a connect error, got {other:?}"),
        }
        assert!(host.shows_healthy());

        // Second consecutive failure crosses the threshold.
        match host.dial().await {
            Err(DialError::Unhealthy) => {}
            other => panic!("expected the unhealthy error, got {other:?}"),
        }
        assert!(!host.shows_healthy());
    }
}
