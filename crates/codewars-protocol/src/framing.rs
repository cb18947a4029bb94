//! Message boundaries on the byte stream.
//!
//! The switch protocol never defined a terminator, so framing is a
//! setting. [`Framing::None`] reproduces the historical behavior: nothing
//! is appended on the way out, and each read chunk counts as one message
//! on the way in. [`Framing::Line`] terminates every outbound command with
//! `\n` and splits inbound bytes on `\n`.

use bytes::{Bytes, BytesMut};
use memchr::memchr;
use serde::{Deserialize, Serialize};

use crate::{Command, ProtocolError};

/// Longest inbound line accepted under [`Framing::Line`].
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 8 * 1024;

/// How commands are delimited on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// No terminator. One read chunk is one message.
    #[default]
    None,
    /// Newline-terminated; a `\r` before the `\n` is ignored on input.
    Line,
}

impl Framing {
    /// Encodes a command for sending.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidPayload`] if line framing is in use and the
    /// command itself contains a newline.
    pub fn encode(self, command: &Command) -> Result<Vec<u8>, ProtocolError> {
        let mut out = command.to_wire().into_bytes();
        if self == Self::Line {
            if memchr(b'\n', &out).is_some() {
                return Err(ProtocolError::InvalidPayload(format!(
                    "{} contains a newline",
                    command.tag()
                )));
            }
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// Accumulates inbound bytes and hands them back one message at a time.
#[derive(Debug)]
pub struct FrameBuffer {
    framing: Framing,
    buf: BytesMut,
    max_message_len: usize,
    /// Set after an overlong line was rejected before its `\n` arrived;
    /// input is dropped up to and including that `\n`.
    discarding: bool,
}

impl FrameBuffer {
    pub fn new(framing: Framing) -> Self {
        Self::with_max_message_len(framing, DEFAULT_MAX_MESSAGE_LEN)
    }

    pub fn with_max_message_len(framing: Framing, max: usize) -> Self {
        Self {
            framing,
            buf: BytesMut::with_capacity(1024),
            max_message_len: max.max(1),
            discarding: false,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Appends bytes read from the socket.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Removes and returns everything buffered, framed or not.
    pub fn take_all(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    /// Pops the next complete message, if one is buffered.
    ///
    /// Blank lines are skipped under line framing.
    ///
    /// # Errors
    /// [`ProtocolError::MessageTooLong`] for a line longer than the maximum
    /// message length, whether or not its `\n` has arrived. The line is
    /// dropped in full, including any of it still to come, so the caller
    /// can keep reading.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        match self.framing {
            Framing::None => {
                Ok((!self.buf.is_empty()).then(|| self.take_all()))
            }
            Framing::Line => loop {
                let Some(i) = memchr(b'\n', &self.buf) else {
                    if self.discarding {
                        self.buf.clear();
                        return Ok(None);
                    }
                    let pending = match self.buf.last() {
                        Some(b'\r') => self.buf.len() - 1,
                        _ => self.buf.len(),
                    };
                    if pending > self.max_message_len {
                        self.buf.clear();
                        self.discarding = true;
                        return Err(self.too_long());
                    }
                    return Ok(None);
                };
                let line = trim_crlf(self.buf.split_to(i + 1).freeze());
                if std::mem::take(&mut self.discarding) {
                    continue;
                }
                if line.len() > self.max_message_len {
                    return Err(self.too_long());
                }
                if !line.is_empty() {
                    return Ok(Some(line));
                }
            },
        }
    }

    fn too_long(&self) -> ProtocolError {
        ProtocolError::MessageTooLong {
            max: self.max_message_len,
        }
    }
}

fn trim_crlf(mut b: Bytes) -> Bytes {
    let mut end = b.len();
    if end > 0 && b[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && b[end - 1] == b'\r' {
        end -= 1;
    }
    b.truncate(end);
    b
}
