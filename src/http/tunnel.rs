//! CONNECT tunneling.
//!
//! # Responsibilities
//! - Parse the CONNECT target and open the origin connection
//! - Answer the handshake with a fixed status line
//! - Relay bytes in both directions without inspecting them
//!
//! # Design Decisions
//! - Each direction is its own task; the first to finish tears the whole
//!   session down, aborting the other and closing both sockets
//! - No half-close: a tunnel either flows in both directions or is gone
//! - Tunneled bytes are never decrypted or parsed

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::TimeoutConfig;
use crate::http::request::RequestHead;
use crate::http::{connect_origin, ProxyError};
use crate::net::framing::CHUNK_SIZE;

/// Handshake reply once the origin connection is up.
const ESTABLISHED: &[u8] = b"HTTP/1.1 200 Connection Established\r\n\r\n";

/// Handshake reply when the origin cannot be reached.
const BAD_GATEWAY: &[u8] = b"HTTP/1.1 502 Bad Gateway\r\n\r\n";

/// Handle one CONNECT request: handshake, then relay until either side
/// closes.
pub async fn tunnel<C>(
    mut client: C,
    head: &RequestHead,
    timeouts: &TimeoutConfig,
) -> Result<(), ProxyError>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let addr = head.tunnel_address()?;
    tracing::info!(origin = %addr, "Opening tunnel");

    let origin = match connect_origin(&addr, timeouts).await {
        Ok(stream) => stream,
        Err(error) => {
            // The client is told the gateway failed before the connection
            // closes; the error still propagates to the dispatcher log.
            let _ = client.write_all(BAD_GATEWAY).await;
            let _ = client.flush().await;
            return Err(error);
        }
    };

    client.write_all(ESTABLISHED).await?;
    client.flush().await?;

    relay(client, origin).await;
    tracing::debug!(origin = %addr, "Tunnel closed");
    Ok(())
}

/// Relay bytes between two streams until either direction ends.
///
/// Both directions run as independent tasks. When one finishes, whether by
/// EOF or error, the other is aborted, dropping all stream halves and
/// closing both underlying sockets, which unblocks any pending read or
/// write.
pub async fn relay<A, B>(client: A, origin: B)
where
    A: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    B: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (origin_read, origin_write) = tokio::io::split(origin);

    let mut upstream = tokio::spawn(copy_chunks(client_read, origin_write));
    let mut downstream = tokio::spawn(copy_chunks(origin_read, client_write));

    tokio::select! {
        result = &mut upstream => {
            log_direction("client->origin", result);
            downstream.abort();
        }
        result = &mut downstream => {
            log_direction("origin->client", result);
            upstream.abort();
        }
    }
}

async fn copy_chunks<R, W>(mut from: R, mut to: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = from.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        to.write_all(&chunk[..n]).await?;
    }
}

fn log_direction(direction: &str, result: Result<io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::debug!(direction, "Tunnel direction reached EOF"),
        Ok(Err(error)) => tracing::debug!(direction, %error, "Tunnel direction errored"),
        Err(error) => tracing::debug!(direction, %error, "Tunnel direction task failed"),
    }
}
