//! Classification of the switch's reply to `REGISTER`.
//!
//! The switch never answers a login with a dedicated status command. A
//! successful login is followed by a `SERVER_MESSAGE` carrying
//! [`LOGIN_CONFIRMATION`]; a refused bot is sent `DISCONNECT_BOT_REMOTE`
//! with a reason. Anything else is reported as [`LoginResponse::Unknown`]
//! and left for the caller to interpret from the raw bytes.

use crate::{Command, Tag};

/// Text the switch puts in its `SERVER_MESSAGE` once a bot is logged in.
pub const LOGIN_CONFIRMATION: &str = "Confirmed Connection";

/// What the login reply says about the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// The switch confirmed the connection.
    Confirmed,
    /// The switch disconnected the bot.
    Rejected { reason: String },
    /// Empty, unparseable, or not about the login.
    Unknown,
}

impl LoginResponse {
    /// Classifies a raw login reply.
    ///
    /// The reply may hold several newline-separated commands. A rejection
    /// anywhere wins over a confirmation.
    pub fn classify(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut confirmed = false;

        for line in text.lines() {
            let Ok(cmd) = Command::parse(line.as_bytes()) else {
                continue;
            };
            match cmd.tag() {
                Tag::DisconnectBotRemote => {
                    return Self::Rejected {
                        reason: cmd.payload().to_string(),
                    };
                }
                Tag::ServerMessage
                    if cmd.payload().contains(LOGIN_CONFIRMATION) =>
                {
                    confirmed = true;
                }
                _ => {}
            }
        }

        if confirmed { Self::Confirmed } else { Self::Unknown }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_message() {
        let raw = b"SERVER_MESSAGE<<GameServer Confirmed Connection";
        assert_eq!(LoginResponse::classify(raw), LoginResponse::Confirmed);
    }

    #[test]
    fn test_disconnect_is_rejection_with_reason() {
        let raw = b"DISCONNECT_BOT_REMOTE<<invalid server key";
        assert_eq!(
            LoginResponse::classify(raw),
            LoginResponse::Rejected {
                reason: "invalid server key".into()
            }
        );
    }

    #[test]
    fn test_rejection_wins_over_confirmation() {
        let raw = b"SERVER_MESSAGE<<GameServer Confirmed Connection\r\n\
                    DISCONNECT_BOT_REMOTE<<duplicate login\n";
        assert!(LoginResponse::classify(raw).is_rejected());
    }

    #[test]
    fn test_other_replies_are_unknown() {
        assert_eq!(LoginResponse::classify(b""), LoginResponse::Unknown);
        assert_eq!(LoginResponse::classify(b"welcome!"), LoginResponse::Unknown);
        assert_eq!(
            LoginResponse::classify(b"SERVER_MESSAGE<<maintenance at noon"),
            LoginResponse::Unknown
        );
    }
}
