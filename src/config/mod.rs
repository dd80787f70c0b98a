//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared with the dispatcher for the process lifetime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload mechanism
//! - All fields have defaults so the proxy runs with no config file at all

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{CacheConfig, ListenerConfig, ProxyConfig, TimeoutConfig};
