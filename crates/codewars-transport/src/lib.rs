//! Transport layer for the Code-Wars client.
//!
//! Provides the [`Connection`] trait (send bytes, read bytes, close) and
//! its only implementation, [`TcpConnection`]: one owned TCP stream to the
//! switch. The transport knows nothing about `TAG<<PAYLOAD` commands; it
//! moves bytes and reports whether the socket is still usable.
//!
//! # Guarantees
//!
//! - `send` writes every byte (partial writes are retried) and two
//!   concurrent sends never interleave.
//! - `recv` performs exactly one read of up to
//!   [`TcpOptions::read_buffer_size`] bytes.
//! - `close` is idempotent, and once it has run every other call fails
//!   with [`TransportError::ConnectionClosed`], including a `recv` that
//!   was already blocked waiting for data.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{DEFAULT_READ_BUFFER_SIZE, TcpConnection, TcpOptions};

use std::fmt;

/// Opaque identifier for a connection, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends all of `data` to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Performs one read from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer has cleanly closed the stream.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection. Calling it again is a no-op.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns `true` once [`close`](Self::close) has run.
    fn is_closed(&self) -> bool;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
