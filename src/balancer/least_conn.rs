//! Least-connections host selection.

use std::sync::Arc;

use crate::balancer::unhealthy::UnhealthyHosts;
use crate::upstream::TcpHost;

/// Select the healthy host with the fewest active connections.
///
/// Single pass over the registry: hosts present in the unhealthy set are
/// skipped; among the remainder the smallest connection count wins, with
/// ties broken by registry order (first encountered). Returns `None` when
/// no healthy host remains.
///
/// Counter reads are not a consistent snapshot; selection may race with
/// concurrent sessions. That is acceptable: the winning increment
/// immediately follows selection and is visible to subsequent passes.
pub fn least_connections(
    hosts: &[Arc<TcpHost>],
    unhealthy: &UnhealthyHosts,
) -> Option<Arc<TcpHost>> {
    let mut selected: Option<&Arc<TcpHost>> = None;

    for host in hosts {
        if unhealthy.is_unhealthy(host.id()) {
            continue;
        }

        // Strict less-than keeps the first host seen among ties.
        match selected {
            Some(s) if host.connection_count() >= s.connection_count() => {}
            _ => selected = Some(host),
        }
    }

    selected.cloned()
}
