//! Plain-HTTP forwarding.
//!
//! # Responsibilities
//! - Resolve the origin from the Host header
//! - Serve cache hits without touching the network
//! - On a miss, relay the origin response chunk-by-chunk while accumulating
//!   it for the cache
//!
//! # Design Decisions
//! - The cache key is the literal request-target token, never the rewritten
//!   path, so absolute-form and origin-form requests cache independently
//! - A save happens only after clean origin EOF; a reset mid-stream leaves
//!   already-forwarded bytes delivered and the cache untouched
//! - Cache storage failures degrade to a logged miss, never a dropped request

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::cache::ResponseCache;
use crate::config::TimeoutConfig;
use crate::http::request::RequestHead;
use crate::http::{connect_origin, ProxyError};
use crate::net::framing::CHUNK_SIZE;

/// Forward one plain HTTP request and relay the origin's response.
pub async fn forward<C>(
    client: &mut C,
    head: &RequestHead,
    cache: Option<&ResponseCache>,
    timeouts: &TimeoutConfig,
) -> Result<(), ProxyError>
where
    C: AsyncWrite + Unpin,
{
    let addr = head.host_address()?;

    if let Some(cache) = cache {
        match cache.get(&head.target).await {
            Ok(Some(bytes)) => {
                tracing::info!(target = %head.target, bytes = bytes.len(), "Serving from cache");
                client.write_all(&bytes).await?;
                client.flush().await?;
                return Ok(());
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%error, target = %head.target, "Cache lookup failed, contacting origin");
            }
        }
    }

    tracing::info!(origin = %addr, target = %head.target, "Forwarding request");

    let mut origin = connect_origin(&addr, timeouts).await?;
    origin
        .write_all(head.rewrite_for_origin().as_bytes())
        .await?;
    origin.flush().await?;

    // Stream the response through, buffering a copy only when it will be
    // cached afterwards.
    let mut response = cache.map(|_| Vec::new());
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = origin.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        client.write_all(&chunk[..n]).await?;
        if let Some(buf) = response.as_mut() {
            buf.extend_from_slice(&chunk[..n]);
        }
    }
    client.flush().await?;

    if let (Some(cache), Some(buf)) = (cache, response) {
        match cache.save(&head.target, &buf).await {
            Ok(()) => {
                tracing::info!(target = %head.target, bytes = buf.len(), "Saved response to cache");
            }
            Err(error) => {
                tracing::warn!(%error, target = %head.target, "Failed to save response to cache");
            }
        }
    }

    Ok(())
}
