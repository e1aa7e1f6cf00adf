//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Client connects
//!     → accept loop (run)
//!     → session task:
//!         least_conn.rs (select healthy host with fewest connections)
//!         → host.dial()
//!             - ok: forward bytes both ways until either side closes
//!             - unhealthy: unhealthy.rs (evict host), re-select
//!             - other error: report to client, close
//!     → connection guard drops (count decremented)
//! ```
//!
//! # Design Decisions
//! - The counter increment lands between selection and dialing, so
//!   later selections observe sessions already in flight
//! - Eviction and retry loop in the session handler; bounded because the
//!   healthy set only shrinks
//! - A host evicted mid-flight keeps its open sessions until they drain

pub mod least_conn;
pub mod unhealthy;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use crate::net::forward::{self, ForwardError};
use crate::net::resolver::{self, NetworkFamily, ResolveError};
use crate::upstream::{DialError, TcpHost};
use self::least_conn::least_connections;
use self::unhealthy::UnhealthyHosts;

/// Error type for balancer operations.
#[derive(Debug, thiserror::Error)]
pub enum BalancerError {
    /// The balancer has no listener: either it was constructed without
    /// one, or `run` was already called.
    #[error("load balancer not initialized")]
    Uninitialized,

    /// The listen address could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Binding the listener failed.
    #[error("unable to listen: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting a client connection failed; terminates the accept loop.
    #[error("unable to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// No healthy upstream host is available for a session.
    #[error("no healthy upstream hosts available")]
    NoHealthyHost,

    /// Dialing the selected host failed without crossing its threshold.
    #[error(transparent)]
    Dial(DialError),

    /// The forwarding phase of a session failed.
    #[error(transparent)]
    Forward(ForwardError),
}

/// A TCP load balancer: one listener, a registry of upstream hosts, and
/// least-connections selection with passive health eviction.
#[derive(Debug)]
pub struct LoadBalancer {
    /// The bound listener; taken by `run`.
    listener: Option<TcpListener>,

    /// Upstream hosts ready for selection. Populated at startup; the
    /// registry order is the selection tie-break.
    hosts: Vec<Arc<TcpHost>>,

    /// Hosts currently out of rotation.
    unhealthy: Arc<UnhealthyHosts>,

    /// Idle deadline applied to the host-to-client direction of every
    /// session.
    host_timeout: Duration,
}

impl LoadBalancer {
    /// Resolve `address` and bind the listener.
    ///
    /// Pass port 0 to listen on an available port; `local_addr` reports
    /// the actual one.
    pub async fn bind(
        address: &str,
        network: NetworkFamily,
        host_timeout: Duration,
    ) -> Result<Self, BalancerError> {
        let addr = resolver::resolve(address, network)?;
        let listener = TcpListener::bind(addr).await.map_err(BalancerError::Bind)?;

        Ok(Self {
            listener: Some(listener),
            hosts: Vec::new(),
            unhealthy: Arc::new(UnhealthyHosts::default()),
            host_timeout,
        })
    }

    /// The address the balancer is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, BalancerError> {
        let listener = self.listener.as_ref().ok_or(BalancerError::Uninitialized)?;
        listener.local_addr().map_err(BalancerError::Bind)
    }

    /// Add an upstream host to the registry.
    ///
    /// Intended for startup wiring, before `run`; sessions spawned by a
    /// running balancer snapshot the registry at accept time.
    pub fn add_upstream(&mut self, host: Arc<TcpHost>) {
        self.hosts.push(host);
    }

    /// Take a host out of rotation.
    pub fn mark_host_unhealthy(&self, host_id: Uuid) {
        self.unhealthy.add(host_id);
    }

    /// Return a host to rotation. Nothing calls this automatically yet;
    /// it is the re-entry point for a future re-probe task.
    pub fn mark_host_healthy(&self, host_id: Uuid) {
        self.unhealthy.remove(host_id);
    }

    /// Number of hosts currently out of rotation.
    pub fn unhealthy_host_count(&self) -> usize {
        self.unhealthy.len()
    }

    /// Accept and handle client sessions until accepting fails.
    ///
    /// Each accepted connection is handled in its own task; per-session
    /// errors are logged and never stop the loop. An accept error
    /// terminates the loop and is returned.
    pub async fn run(&mut self) -> Result<(), BalancerError> {
        let listener = self.listener.take().ok_or(BalancerError::Uninitialized)?;

        let session = Session {
            hosts: Arc::new(self.hosts.clone()),
            unhealthy: Arc::clone(&self.unhealthy),
            host_timeout: self.host_timeout,
        };

        loop {
            let (client, peer) = listener.accept().await.map_err(BalancerError::Accept)?;
            tracing::info!(peer = %peer, "accepted client connection");

            let session = session.clone();
            tokio::spawn(async move {
                if let Err(e) = session.handle(client).await {
                    tracing::warn!(peer = %peer, error = %e, "unable to handle connection");
                }
            });
        }
    }
}

/// Shared context for one client session.
#[derive(Clone)]
struct Session {
    hosts: Arc<Vec<Arc<TcpHost>>>,
    unhealthy: Arc<UnhealthyHosts>,
    host_timeout: Duration,
}

impl Session {
    /// Select a host, dial it, and forward until the session ends.
    ///
    /// When a dial pushes a host past its failure threshold the host is
    /// evicted and selection re-runs with the same client. The loop is
    /// bounded: each eviction shrinks the healthy set, and an empty set
    /// ends the session with `NoHealthyHost`. No lock is held across
    /// iterations.
    async fn handle(self, mut client: TcpStream) -> Result<(), BalancerError> {
        loop {
            let Some(host) = least_connections(&self.hosts, &self.unhealthy) else {
                respond_and_close(&mut client, "no healthy upstream hosts available").await;
                return Err(BalancerError::NoHealthyHost);
            };

            // The guard pairs this increment with exactly one decrement,
            // on every exit path below.
            let guard = host.track_connection();

            match host.dial().await {
                Ok(upstream) => {
                    tracing::debug!(
                        host = %host.address(),
                        active = host.connection_count(),
                        "forwarding session to host"
                    );

                    let result = forward::forward(client, upstream, self.host_timeout).await;
                    drop(guard);
                    return result.map_err(BalancerError::Forward);
                }
                Err(DialError::Unhealthy) => {
                    tracing::warn!(
                        host = %host.address(),
                        "host crossed its failure threshold, removing from rotation"
                    );
                    self.unhealthy.add(host.id());
                    drop(guard);
                    // Re-select for the same client.
                }
                Err(e) => {
                    drop(guard);
                    respond_and_close(&mut client, &e.to_string()).await;
                    return Err(BalancerError::Dial(e));
                }
            }
        }
    }
}

/// Report an error line to the client, then close the connection.
async fn respond_and_close(conn: &mut TcpStream, message: &str) {
    if let Err(e) = conn.write_all(format!("{message}\n").as_bytes()).await {
        tracing::debug!(error = %e, "unable to write to client connection");
    }
    if let Err(e) = conn.shutdown().await {
        tracing::debug!(error = %e, "unable to close client connection");
    }
}
