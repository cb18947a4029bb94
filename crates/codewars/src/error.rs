//! Unified error type for the Code-Wars client.

use codewars_protocol::ProtocolError;
use codewars_transport::TransportError;

/// Top-level error that wraps the per-crate errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so `?`
/// converts transport and protocol errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A transport-level error (connect, send, receive, closed, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (bad payload, unparseable message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The client configuration could not be decoded.
    #[cfg(feature = "json")]
    #[error("invalid client config: {0}")]
    Config(#[from] serde_json::Error),

    /// The switch refused the login. Only returned when
    /// `ClientConfig::require_login_confirmation` is set.
    #[error("login rejected: {0}")]
    LoginRejected(String),
}

impl ClientError {
    /// `true` when the operation failed because the connection was
    /// already closed, locally or by the peer.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_closed())
    }

    /// `true` for socket failures: connect, write, read or timeout.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Transport(e) if !e.is_closed())
    }
}
