//! Upstream host subsystem.
//!
//! # Data Flow
//! ```text
//! Session handler
//!     → host.rs (dial, RAII connection guard)
//!         → connections.rs (active connection count)
//!         → health.rs (consecutive dial failures vs. threshold)
//! ```
//!
//! # Design Decisions
//! - Each host exclusively owns its counter and tracker; no cross-host
//!   locks exist
//! - Health changes only where real traffic dials the host, so no probe
//!   can disagree with observed behavior

pub mod connections;
pub mod health;
pub mod host;

pub use connections::Counter;
pub use health::{Tracker, DEFAULT_FAILURE_THRESHOLD};
pub use host::{ConnectionGuard, DialError, HostError, TcpHost, CONNECT_TIMEOUT};
