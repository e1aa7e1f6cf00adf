//! Configuration schema definitions.
//!
//! All types derive Serde traits and carry defaults so a minimal (or
//! empty) configuration is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::resolver::NetworkFamily;
use crate::upstream::DEFAULT_FAILURE_THRESHOLD;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Upstream hosts registered at startup.
    pub upstreams: Vec<UpstreamConfig>,

    /// Consecutive dial failures tolerated before a host is evicted.
    pub failure_threshold: u32,

    /// Idle deadline, in seconds, on the host-to-client direction.
    pub host_timeout_secs: u64,
}

impl BalancerConfig {
    /// The host timeout as a duration.
    pub fn host_timeout(&self) -> Duration {
        Duration::from_secs(self.host_timeout_secs)
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstreams: Vec::new(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            host_timeout_secs: 30,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address; port 0 listens on an available port.
    pub bind_address: String,

    /// Network family restriction for the bind address.
    pub network: NetworkFamily,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:0".to_string(),
            network: NetworkFamily::default(),
        }
    }
}

/// A single upstream host entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Host address (e.g. "127.0.0.1:9000").
    pub address: String,

    /// Network family restriction for resolution.
    #[serde(default)]
    pub network: NetworkFamily,
}
