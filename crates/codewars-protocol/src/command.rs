//! Tagged commands: the `TAG<<PAYLOAD` strings exchanged with the switch.
//!
//! Outbound commands can only be built through constructors that check
//! the payload, so a command that reaches the socket always has exactly
//! one separator. Inbound commands are parsed leniently: the payload is
//! everything after the first `<<`, and unknown tags are kept as
//! [`Tag::Other`] instead of being rejected.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Separator between a command's tag and its payload.
pub const SEPARATOR: &str = "<<";

/// Payload of the keep-alive ping.
pub const PING_PAYLOAD: &str = "null";

/// Payload the client answers a challenge with.
pub const ACCEPT_PAYLOAD: &str = "go";

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// The keyword prefix of a command, identifying its intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    // -- Client → switch --
    /// Login handshake, payload `name:key`.
    Register,
    /// Keep-alive.
    ServerPing,
    /// The cards a bot plays in answer to `PLAYCARDS_REQUEST`.
    PlaycardsReply,
    /// A bot's answer to `TURN_SUMMARY`.
    TurnReply,

    // -- Both directions --
    /// Server: a new game is offered. Client: the offer is accepted.
    GameInitialize,

    // -- Switch → client --
    /// Free-form status text, including the login confirmation.
    ServerMessage,
    /// Seating chart of a new game.
    GameOrder,
    /// Cards dealt to (or picked up by) the bot.
    CardMessage,
    /// It is the bot's move.
    PlaycardsRequest,
    /// Another player's move, awaiting a turn reply.
    TurnSummary,
    /// Outcome of a call.
    BullshitResult,
    /// The game is over.
    GameWinner,
    /// The game was cancelled.
    GameAbort,
    /// The switch dropped the bot; the payload is the reason.
    DisconnectBotRemote,

    /// Any tag this crate does not know about.
    Other(String),
}

impl Tag {
    /// Every tag with a fixed spelling.
    pub const KNOWN: [Tag; 14] = [
        Tag::Register,
        Tag::ServerPing,
        Tag::PlaycardsReply,
        Tag::TurnReply,
        Tag::GameInitialize,
        Tag::ServerMessage,
        Tag::GameOrder,
        Tag::CardMessage,
        Tag::PlaycardsRequest,
        Tag::TurnSummary,
        Tag::BullshitResult,
        Tag::GameWinner,
        Tag::GameAbort,
        Tag::DisconnectBotRemote,
    ];

    /// The wire spelling of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Register => "REGISTER",
            Self::ServerPing => "SERVER_PING",
            Self::PlaycardsReply => "PLAYCARDS_REPLY",
            Self::TurnReply => "TURN_REPLY",
            Self::GameInitialize => "GAME_INITIALIZE",
            Self::ServerMessage => "SERVER_MESSAGE",
            Self::GameOrder => "GAME_ORDER",
            Self::CardMessage => "CARD_MESSAGE",
            Self::PlaycardsRequest => "PLAYCARDS_REQUEST",
            Self::TurnSummary => "TURN_SUMMARY",
            Self::BullshitResult => "BULLSHIT_RESULT",
            Self::GameWinner => "GAME_WINNER",
            Self::GameAbort => "GAME_ABORT",
            Self::DisconnectBotRemote => "DISCONNECT_BOT_REMOTE",
            Self::Other(tag) => tag,
        }
    }

    /// Maps a wire spelling to a tag. Never fails.
    pub fn from_wire(s: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .unwrap_or_else(|| Self::Other(s.to_string()))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One `TAG<<PAYLOAD` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tag: Tag,
    payload: String,
}

impl Command {
    /// Builds a command, rejecting anything that would break framing.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidPayload`] if the payload contains `<<`, or
    /// if an [`Tag::Other`] tag is empty or contains `<<`.
    pub fn new(
        tag: Tag,
        payload: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let payload = payload.into();
        if let Tag::Other(raw) = &tag {
            if raw.is_empty() || raw.contains(SEPARATOR) {
                return Err(ProtocolError::InvalidPayload(format!(
                    "tag {raw:?} is empty or contains `{SEPARATOR}`"
                )));
            }
        }
        if payload.contains(SEPARATOR) {
            return Err(ProtocolError::InvalidPayload(format!(
                "payload for {tag} contains `{SEPARATOR}`"
            )));
        }
        Ok(Self { tag, payload })
    }

    /// `REGISTER<<{server_name}:{server_key}`.
    pub fn register(
        server_name: &str,
        server_key: &str,
    ) -> Result<Self, ProtocolError> {
        Self::new(Tag::Register, format!("{server_name}:{server_key}"))
    }

    /// `SERVER_PING<<null`.
    pub fn ping() -> Self {
        Self {
            tag: Tag::ServerPing,
            payload: PING_PAYLOAD.to_string(),
        }
    }

    /// `GAME_INITIALIZE<<go`.
    pub fn accept_challenge() -> Self {
        Self {
            tag: Tag::GameInitialize,
            payload: ACCEPT_PAYLOAD.to_string(),
        }
    }

    /// `PLAYCARDS_REPLY<<{reply}`.
    pub fn playcards_reply(reply: &str) -> Result<Self, ProtocolError> {
        Self::new(Tag::PlaycardsReply, reply)
    }

    /// `TURN_REPLY<<{reply}`.
    pub fn turn_reply(reply: &str) -> Result<Self, ProtocolError> {
        Self::new(Tag::TurnReply, reply)
    }

    /// Parses one inbound message.
    ///
    /// The tag runs up to the first `<<`; the payload is the rest,
    /// verbatim apart from a trailing line ending.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if the bytes are not UTF-8, have no
    /// separator, or have an empty tag.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ProtocolError::InvalidMessage(format!("not UTF-8: {e}"))
        })?;
        let text = text.trim_end_matches(['\r', '\n']);

        let Some((tag, payload)) = text.split_once(SEPARATOR) else {
            return Err(ProtocolError::InvalidMessage(format!(
                "missing `{SEPARATOR}` in {text:?}"
            )));
        };
        if tag.is_empty() {
            return Err(ProtocolError::InvalidMessage(format!(
                "empty tag in {text:?}"
            )));
        }

        Ok(Self {
            tag: Tag::from_wire(tag),
            payload: payload.to_string(),
        })
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_parts(self) -> (Tag, String) {
        (self.tag, self.payload)
    }

    /// The command as it appears on the wire, without any terminator.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.tag, self.payload)
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_name_colon_key() {
        let cmd = Command::register("test", "key123").unwrap();
        assert_eq!(cmd.to_wire(), "REGISTER<<test:key123");
    }

    #[test]
    fn test_fixed_commands() {
        assert_eq!(Command::ping().to_wire(), "SERVER_PING<<null");
        assert_eq!(Command::accept_challenge().to_wire(), "GAME_INITIALIZE<<go");
    }

    #[test]
    fn test_reply_commands_carry_payload_verbatim() {
        let cards = Command::playcards_reply("3H,4H").unwrap();
        assert_eq!(cards.to_wire(), "PLAYCARDS_REPLY<<3H,4H");

        let turn = Command::turn_reply("pass").unwrap();
        assert_eq!(turn.to_wire(), "TURN_REPLY<<pass");
    }

    #[test]
    fn test_empty_payload_is_allowed() {
        let cmd = Command::turn_reply("").unwrap();
        assert_eq!(cmd.to_wire(), "TURN_REPLY<<");
    }

    #[test]
    fn test_payload_with_separator_is_rejected() {
        let err = Command::playcards_reply("3H<<4H").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload(_)));

        let err = Command::register("evil<<", "key").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload(_)));
    }

    #[test]
    fn test_other_tag_must_be_non_empty_without_separator() {
        assert!(Command::new(Tag::Other(String::new()), "x").is_err());
        assert!(Command::new(Tag::Other("A<<B".into()), "x").is_err());

        let cmd = Command::new(Tag::Other("CHALLENGE".into()), "").unwrap();
        assert_eq!(cmd.to_wire(), "CHALLENGE<<");
    }

    #[test]
    fn test_parse_known_tag() {
        let cmd = Command::parse(b"PLAYCARDS_REQUEST<<5").unwrap();
        assert_eq!(cmd.tag(), &Tag::PlaycardsRequest);
        assert_eq!(cmd.payload(), "5");
    }

    #[test]
    fn test_parse_unknown_tag_is_preserved() {
        let cmd: Command = "LOGIN_INFORM<<144:mode=1".parse().unwrap();
        assert_eq!(cmd.tag(), &Tag::Other("LOGIN_INFORM".into()));
        assert_eq!(cmd.payload(), "144:mode=1");
    }

    #[test]
    fn test_parse_splits_on_first_separator_only() {
        let cmd = Command::parse(b"SERVER_MESSAGE<<a<<b").unwrap();
        assert_eq!(cmd.tag(), &Tag::ServerMessage);
        assert_eq!(cmd.payload(), "a<<b");
    }

    #[test]
    fn test_parse_strips_trailing_line_ending() {
        let cmd = Command::parse(b"GAME_ABORT<<\r\n").unwrap();
        assert_eq!(cmd.tag(), &Tag::GameAbort);
        assert_eq!(cmd.payload(), "");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(
            Command::parse(b"no separator here"),
            Err(ProtocolError::InvalidMessage(_))
        ));
        assert!(matches!(
            Command::parse(b"<<payload"),
            Err(ProtocolError::InvalidMessage(_))
        ));
        assert!(matches!(
            Command::parse(&[0xff, 0xfe, b'<', b'<']),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_tag_from_wire_covers_every_known_tag() {
        for tag in Tag::KNOWN {
            assert_eq!(Tag::from_wire(tag.as_str()), tag);
        }
    }
}
