//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, semantic checks)
//!     → BalancerConfig (validated)
//!     → CLI flags override listener port / append upstreams
//! ```
//!
//! # Design Decisions
//! - Configuration is immutable once loaded; the registry is wired from
//!   it at startup
//! - All fields have defaults so the CLI alone can drive everything

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{BalancerConfig, ListenerConfig, UpstreamConfig};
