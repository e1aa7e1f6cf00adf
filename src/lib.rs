//! Layer-4 TCP load balancer.
//!
//! # Architecture Overview
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                LOAD BALANCER                   │
//!                    │                                                │
//!   Client ──────────┼─▶ accept loop ──▶ least-connections selector   │
//!                    │        │               │   (skips unhealthy)   │
//!                    │        ▼               ▼                       │
//!                    │   session task ──▶ host dial ──▶ forwarder ────┼──▶ Upstream
//!                    │        │               │            │          │     Host
//!   Client ◀─────────┼────────┴───────────────┴────────────┴──────────┼──◀
//!                    │                                                │
//!                    │   per-host: connection counter + failure       │
//!                    │   tracker; shared: unhealthy host set          │
//!                    └───────────────────────────────────────────────┘
//! ```
//!
//! Hosts that fail to accept connections past their failure threshold are
//! taken out of rotation; sessions already in flight drain normally.

pub mod balancer;
pub mod config;
pub mod net;
pub mod upstream;

pub use balancer::{BalancerError, LoadBalancer};
pub use config::BalancerConfig;
pub use net::resolver::NetworkFamily;
pub use upstream::TcpHost;
