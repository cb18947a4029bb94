//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes or strings involved are wrong,
//! never that the socket is. Network failures live in
//! `codewars_transport::TransportError`.

/// Errors that can occur while building, framing or parsing commands.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A tag or payload would corrupt the framing of the command
    /// (it contains the `<<` separator, or a line terminator when
    /// line framing is in use).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Inbound bytes are not a `TAG<<PAYLOAD` command.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// An inbound message grew past the configured maximum length
    /// without a terminator.
    #[error("message exceeds {max} bytes without a terminator")]
    MessageTooLong { max: usize },
}
