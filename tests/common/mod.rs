//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tcp_balancer::{LoadBalancer, NetworkFamily, TcpHost};

/// Start a mock upstream host that acknowledges every chunk it reads
/// with `Data '<chunk>' received`.
pub async fn start_echo_host() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 2048];
                        loop {
                            let n = match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => n,
                            };
                            let reply =
                                format!("Data '{}' received", String::from_utf8_lossy(&buf[..n]));
                            if socket.write_all(reply.as_bytes()).await.is_err() {
                                return;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address that refuses connections: bind a listener to reserve a
/// port, then drop it.
#[allow(dead_code)]
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Bind a balancer on loopback with the given hosts, run it in the
/// background, and return its address.
pub async fn spawn_balancer(hosts: Vec<Arc<TcpHost>>, host_timeout: Duration) -> SocketAddr {
    let mut balancer = LoadBalancer::bind("127.0.0.1:0", NetworkFamily::Tcp, host_timeout)
        .await
        .unwrap();
    for host in hosts {
        balancer.add_upstream(host);
    }
    let addr = balancer.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = balancer.run().await;
    });

    addr
}

/// A unique 16-byte payload.
pub fn random_payload() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Poll a host's connection count until it reaches `expected`.
#[allow(dead_code)]
pub async fn wait_for_count(host: &Arc<TcpHost>, expected: usize, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if host.connection_count() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
