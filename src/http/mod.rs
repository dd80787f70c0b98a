//! Connection-handling subsystem.
//!
//! # Data Flow
//! ```text
//! Framed request head
//!     → request.rs (parse, classify, rewrite)
//!     → forwarder.rs (plain HTTP: cache lookup, origin relay)
//!       or tunnel.rs (CONNECT: handshake + bidirectional relay)
//! ```
//!
//! # Design Decisions
//! - Per-connection failures are values (`ProxyError`), carried up to the
//!   dispatcher task which logs and closes; no unwinding across tasks
//! - Origin connects are the only timed operation in the pipeline

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::config::TimeoutConfig;

pub mod forwarder;
pub mod request;
pub mod server;
pub mod tunnel;

pub use request::{RequestHead, TargetAddr};
pub use server::ProxyServer;

/// Error type for a single proxied connection.
///
/// Every variant is contained within the connection's task; the accept loop
/// never sees these.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("malformed request line {0:?}")]
    MalformedRequest(String),

    #[error("no Host header in request")]
    MissingHost,

    #[error("invalid port in {0:?}")]
    BadPort(String),

    #[error("invalid tunnel target {0:?} (expected host:port)")]
    BadTunnelTarget(String),

    #[error("timed out connecting to {0}")]
    ConnectTimeout(TargetAddr),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Open a TCP connection to an origin server, bounded by the configured
/// connect timeout. Name resolution happens inside `TcpStream::connect`.
pub(crate) async fn connect_origin(
    addr: &TargetAddr,
    timeouts: &TimeoutConfig,
) -> Result<TcpStream, ProxyError> {
    let connect = TcpStream::connect((addr.host.as_str(), addr.port));
    match tokio::time::timeout(Duration::from_secs(timeouts.connect_secs), connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(ProxyError::Io(e)),
        Err(_) => Err(ProxyError::ConnectTimeout(addr.clone())),
    }
}
