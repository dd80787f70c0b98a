//! Request-head framing.
//!
//! # Responsibilities
//! - Accumulate raw bytes from a client stream until the end-of-headers
//!   marker (`\r\n\r\n`) has been observed
//! - Signal a clean disconnect (EOF before the marker) as an absent result
//!
//! # Design Decisions
//! - The whole accumulated buffer is rescanned after each chunk; quadratic on
//!   slow-trickle input, fine at request-head sizes
//! - Request bodies are not captured: bytes past the terminator that arrive
//!   in the same chunk stay in the returned text and are never forwarded

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Read chunk size, shared with the relay loops in `http`.
pub(crate) const CHUNK_SIZE: usize = 8 * 1024;

/// End-of-headers marker.
const HEAD_END: &[u8] = b"\r\n\r\n";

/// Read from `stream` until a full HTTP request head has accumulated.
///
/// Returns `Ok(None)` if the peer closes the stream before a complete head
/// arrives; such connections are dropped without a response. The bytes are
/// interpreted as ASCII/Latin-1 request text.
pub async fn read_request_head<R>(stream: &mut R) -> io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut head = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        head.extend_from_slice(&chunk[..n]);

        if head.windows(HEAD_END.len()).any(|w| w == HEAD_END) {
            return Ok(Some(String::from_utf8_lossy(&head).into_owned()));
        }
    }
}
