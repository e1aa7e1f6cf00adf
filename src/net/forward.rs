//! Bidirectional byte forwarding between a client and an upstream host.
//!
//! # Termination Contract
//! `forward` returns as soon as the first copy direction completes:
//! - client closed with no error → `Ok`
//! - client-side copy error → `Client`
//! - upstream closed before the client disconnected → `HostClosedEarly`
//! - upstream-side copy error or idle timeout → `Upstream`
//!
//! Waiting for both directions would block indefinitely on a half-open
//! client; returning on the first completion bounds how long failures
//! take to surface.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

const COPY_BUFFER_SIZE: usize = 8192;

/// Error type for a forwarding session.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The upstream host closed the connection while the client was still
    /// connected. Anomalous for a pure byte pipe; callers may log it.
    #[error("host closed the connection before the client disconnected")]
    HostClosedEarly,

    /// The client-to-upstream direction failed.
    #[error("client to host copy failed: {0}")]
    Client(#[source] io::Error),

    /// The upstream-to-client direction failed, including an expired idle
    /// deadline on the upstream read.
    #[error("host to client copy failed: {0}")]
    Upstream(#[source] io::Error),
}

/// Splice bytes between `client` and `upstream` until one direction
/// completes.
///
/// Only the upstream read direction carries a deadline: each read must
/// arrive within `host_timeout` or the session fails. The client
/// direction is unbounded; the client dictates when the session ends.
///
/// Both sockets are owned by this function and dropped on return, so
/// every exit path closes both endpoints exactly once.
pub async fn forward(
    mut client: TcpStream,
    mut upstream: TcpStream,
    host_timeout: Duration,
) -> Result<(), ForwardError> {
    debug_assert!(!host_timeout.is_zero(), "host timeout must be positive");

    let (mut client_rd, mut client_wr) = client.split();
    let (mut upstream_rd, mut upstream_wr) = upstream.split();

    tokio::select! {
        res = copy(&mut client_rd, &mut upstream_wr) => match res {
            Ok(bytes) => {
                tracing::debug!(bytes, "client closed the session");
                Ok(())
            }
            Err(e) => Err(ForwardError::Client(e)),
        },
        res = copy_with_idle_deadline(&mut upstream_rd, &mut client_wr, host_timeout) => match res {
            Ok(bytes) => {
                tracing::debug!(bytes, "host closed before the client disconnected");
                Err(ForwardError::HostClosedEarly)
            }
            Err(e) => Err(ForwardError::Upstream(e)),
        },
    }
}

/// Copy until EOF on the reader, returning total bytes written.
async fn copy<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        match reader.read(&mut buf).await? {
            0 => return Ok(total),
            n => {
                writer.write_all(&buf[..n]).await?;
                total += n as u64;
            }
        }
    }
}

/// Copy until EOF, failing if any single read takes longer than `deadline`.
async fn copy_with_idle_deadline<R, W>(
    reader: &mut R,
    writer: &mut W,
    deadline: Duration,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = tokio::time::timeout(deadline, reader.read(&mut buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "host read deadline expired"))??;

        match read {
            0 => return Ok(total),
            n => {
                writer.write_all(&buf[..n]).await?;
                total += n as u64;
            }
        }
    }
}
