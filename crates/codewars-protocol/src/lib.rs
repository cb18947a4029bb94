//! Wire protocol for the Code-Wars switch.
//!
//! This crate defines the "language" the client and the switch speak:
//!
//! - **Commands** ([`Command`], [`Tag`]) — the `TAG<<PAYLOAD` strings that
//!   travel on the wire, with constructors that refuse payloads which
//!   would corrupt the framing.
//! - **Framing** ([`Framing`], [`FrameBuffer`]) — where one message ends
//!   and the next begins.
//! - **Login** ([`LoginResponse`]) — what the reply to `REGISTER` means.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the client
//! (login and game calls). It doesn't know about sockets.
//!
//! ```text
//! Transport (bytes) → Protocol (Command) → Client (ProtocolClient)
//! ```

mod command;
mod error;
mod framing;
mod login;

pub use command::{ACCEPT_PAYLOAD, Command, PING_PAYLOAD, SEPARATOR, Tag};
pub use error::ProtocolError;
pub use framing::{DEFAULT_MAX_MESSAGE_LEN, FrameBuffer, Framing};
pub use login::{LOGIN_CONFIRMATION, LoginResponse};
