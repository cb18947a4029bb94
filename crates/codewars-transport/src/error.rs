/// Errors that can occur in the transport layer.
///
/// Every variant except [`ConnectionClosed`](Self::ConnectionClosed) is a
/// connection error: the socket failed underneath us. `ConnectionClosed`
/// means the connection was already shut, by us or by the peer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Opening the TCP connection failed (refused, unreachable, DNS).
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A configured connect/read/write timeout elapsed.
    #[error("{0} timed out")]
    TimedOut(&'static str),
}

impl TransportError {
    /// Returns `true` if this error means the connection is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed(_))
    }

    pub(crate) fn closed_locally() -> Self {
        Self::ConnectionClosed("closed locally".into())
    }
}
