//! Forward HTTP proxy library.
//!
//! Accepts client connections, frames and parses the request head, and
//! either relays plain HTTP requests to their origin (optionally through an
//! on-disk response cache) or opens a raw CONNECT tunnel for HTTPS traffic.

pub mod cache;
pub mod config;
pub mod http;
pub mod net;

pub use cache::ResponseCache;
pub use config::ProxyConfig;
pub use http::ProxyServer;
pub use net::Listener;
