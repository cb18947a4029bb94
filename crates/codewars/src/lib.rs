//! # codewars
//!
//! Client for the Code-Wars game switch.
//!
//! A [`ProtocolClient`] owns one TCP connection, logs in while it is being
//! constructed, and then offers one call per protocol command. Commands
//! are `TAG<<PAYLOAD` strings; see [`codewars_protocol`] for the format and
//! [`codewars_transport`] for the socket.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codewars::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = ProtocolClient::builder("my-bot", "13579").connect().await?;
//! println!("{:?}", client.login_status());
//!
//! loop {
//!     let msg = client.next_message().await?;
//!     match msg.tag() {
//!         Tag::GameInitialize => client.accept_challenge().await?,
//!         Tag::TurnSummary => client.turn_reply("pass").await?,
//!         Tag::GameWinner => break,
//!         _ => {}
//!     }
//! }
//! client.close().await
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{ProtocolClient, ProtocolClientBuilder};
pub use codewars_protocol::{Command, Framing, LoginResponse, ProtocolError, Tag};
pub use codewars_transport::TransportError;
pub use config::{
    ClientConfig, Credentials, DEFAULT_HOST, DEFAULT_LANGUAGE, DEFAULT_PORT,
    DEFAULT_ROOM_ID,
};
pub use error::ClientError;

/// Everything needed to connect and exchange commands.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientError, Command, Credentials, Framing,
        LoginResponse, ProtocolClient, ProtocolClientBuilder, Tag,
    };
}
