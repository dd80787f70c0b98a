//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → framing.rs (read the request head off the raw stream)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Framing is a pure byte-boundary concern; header parsing lives in `http`

pub mod framing;
pub mod listener;

pub use framing::read_request_head;
pub use listener::{ConnectionPermit, Listener, ListenerError};
