//! Connection dispatch.
//!
//! # Responsibilities
//! - Accept connections and spawn one task per client
//! - Frame the request head and route by method
//! - Contain every per-connection failure inside its task
//!
//! # Design Decisions
//! - `CONNECT` goes to the tunnel; every other method is forwarded as plain
//!   HTTP
//! - A client that disconnects before completing a head is dropped silently
//! - The accept loop survives both accept errors and connection failures

use std::sync::Arc;

use tokio::net::TcpStream;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::http::request::RequestHead;
use crate::http::{forwarder, tunnel, ProxyError};
use crate::net::framing::read_request_head;
use crate::net::listener::Listener;

/// The proxy's connection dispatcher.
pub struct ProxyServer {
    config: ProxyConfig,
    cache: Option<ResponseCache>,
}

impl ProxyServer {
    /// Create a dispatcher from configuration. The cache handle is built
    /// here once and shared by every connection task.
    pub fn new(config: ProxyConfig) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResponseCache::new(config.cache.dir.clone()));
        Self { config, cache }
    }

    /// Run the accept loop forever.
    ///
    /// Accept errors are logged and the loop continues; a failing connection
    /// task never takes the listener down.
    pub async fn run(self, listener: Listener) {
        let server = Arc::new(self);
        loop {
            let (stream, peer, permit) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    tracing::warn!(%error, "Accept failed");
                    continue;
                }
            };

            let server = Arc::clone(&server);
            tokio::spawn(async move {
                // Held for the connection's lifetime; releasing it frees the
                // listener slot.
                let _permit = permit;
                if let Err(error) = server.handle_connection(stream).await {
                    tracing::warn!(peer = %peer, %error, "Connection failed");
                }
            });
        }
    }

    /// Handle one accepted connection end to end.
    async fn handle_connection(&self, mut stream: TcpStream) -> Result<(), ProxyError> {
        let raw = match read_request_head(&mut stream).await? {
            Some(raw) => raw,
            // Peer closed before sending a complete head.
            None => return Ok(()),
        };

        let head = RequestHead::parse(&raw)?;
        if head.is_connect() {
            tunnel::tunnel(stream, &head, &self.config.timeouts).await
        } else {
            forwarder::forward(&mut stream, &head, self.cache.as_ref(), &self.config.timeouts)
                .await
        }
    }
}
