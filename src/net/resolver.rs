//! Address resolution for listeners and upstream hosts.
//!
//! # Responsibilities
//! - Resolve a host:port string to a concrete socket address
//! - Restrict resolution to a requested network family (tcp4/tcp6)
//!
//! # Design Decisions
//! - Resolution happens once, at construction time; hosts and listeners
//!   never re-resolve
//! - `tcp` accepts the first address of either family

use std::net::{SocketAddr, ToSocketAddrs};

use serde::{Deserialize, Serialize};

/// Error type for address resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The address string could not be resolved at all.
    #[error("unable to resolve address '{address}': {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Resolution succeeded but produced no address of the requested family.
    #[error("no {family} address available for '{address}'")]
    NoAddress {
        address: String,
        family: NetworkFamily,
    },
}

/// Network family restriction for a socket address.
///
/// Only stream TCP is supported; the family narrows which resolved
/// addresses are acceptable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkFamily {
    /// Either address family.
    #[default]
    Tcp,
    /// IPv4 only.
    Tcp4,
    /// IPv6 only.
    Tcp6,
}

impl NetworkFamily {
    /// Whether the resolved address matches this family.
    pub fn matches(&self, addr: &SocketAddr) -> bool {
        match self {
            NetworkFamily::Tcp => true,
            NetworkFamily::Tcp4 => addr.is_ipv4(),
            NetworkFamily::Tcp6 => addr.is_ipv6(),
        }
    }
}

impl std::fmt::Display for NetworkFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkFamily::Tcp => write!(f, "tcp"),
            NetworkFamily::Tcp4 => write!(f, "tcp4"),
            NetworkFamily::Tcp6 => write!(f, "tcp6"),
        }
    }
}

/// Resolve `address` to the first socket address of the requested family.
pub fn resolve(address: &str, family: NetworkFamily) -> Result<SocketAddr, ResolveError> {
    let candidates = address
        .to_socket_addrs()
        .map_err(|source| ResolveError::Resolve {
            address: address.to_string(),
            source,
        })?;

    candidates
        .into_iter()
        .find(|a| family.matches(a))
        .ok_or_else(|| ResolveError::NoAddress {
            address: address.to_string(),
            family,
        })
}
