//! Client configuration and login credentials.

use std::time::Duration;

use codewars_protocol::{Command, DEFAULT_MAX_MESSAGE_LEN, Framing, ProtocolError};
use codewars_transport::TcpOptions;
use serde::{Deserialize, Serialize};

/// Host of the public switch.
pub const DEFAULT_HOST: &str = "www.code-wars.com";

/// Port of the public switch.
pub const DEFAULT_PORT: u16 = 3000;

/// Room id used when none is given.
pub const DEFAULT_ROOM_ID: &str = "null";

/// Language reported when none is given.
pub const DEFAULT_LANGUAGE: &str = "python";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Identity presented to the switch.
///
/// Only the server name and key go on the wire. The room id and language
/// are kept so callers can read them back, but the `REGISTER` command does
/// not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub server_name: String,
    pub server_key: String,
    #[serde(default = "default_room_id")]
    pub room_id: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_room_id() -> String {
    DEFAULT_ROOM_ID.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Credentials {
    pub fn new(server_name: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            server_key: server_key.into(),
            room_id: default_room_id(),
            language: default_language(),
        }
    }

    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = room_id.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// The `REGISTER<<{server_name}:{server_key}` command.
    pub fn login_command(&self) -> Result<Command, ProtocolError> {
        Command::register(&self.server_name, &self.server_key)
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Connection settings for a [`ProtocolClient`](crate::ProtocolClient).
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```rust
/// # #[cfg(feature = "json")] {
/// use codewars::ClientConfig;
/// use codewars::Framing;
///
/// let config = ClientConfig::from_json(r#"{ "port": 4000, "inbound_framing": "line" }"#)?;
/// assert_eq!(config.host, "www.code-wars.com");
/// assert_eq!(config.port, 4000);
/// assert_eq!(config.inbound_framing, Framing::Line);
/// # }
/// # Ok::<(), codewars::ClientError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Switch host name or address.
    pub host: String,

    /// Switch TCP port.
    pub port: u16,

    /// Maximum bytes returned by one `receive()`, and the size of the
    /// single login-response read.
    pub read_buffer_size: usize,

    /// Terminator appended to typed commands (login included).
    pub outbound_framing: Framing,

    /// How `next_message()` splits inbound bytes.
    pub inbound_framing: Framing,

    /// Longest inbound line accepted under line framing.
    pub max_message_len: usize,

    /// Bound on establishing the TCP connection. `None` waits forever.
    pub connect_timeout: Option<Duration>,

    /// Bound on each read. `None` waits forever.
    pub read_timeout: Option<Duration>,

    /// Bound on each write. `None` waits forever.
    pub write_timeout: Option<Duration>,

    /// Fail construction when the switch answers the login with a
    /// disconnect. Off by default: any reply, or none, counts as success.
    pub require_login_confirmation: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_buffer_size: codewars_transport::DEFAULT_READ_BUFFER_SIZE,
            outbound_framing: Framing::None,
            inbound_framing: Framing::None,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            require_login_confirmation: false,
        }
    }
}

impl ClientConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, crate::ClientError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Socket options derived from this config.
    pub fn tcp_options(&self) -> TcpOptions {
        TcpOptions {
            read_buffer_size: self.read_buffer_size,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_public_switch() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "www.code-wars.com");
        assert_eq!(config.port, 3000);
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.outbound_framing, Framing::None);
        assert!(!config.require_login_confirmation);
    }

    #[test]
    fn test_tcp_options_mirror_config() {
        let config = ClientConfig {
            read_buffer_size: 64,
            read_timeout: Some(Duration::from_secs(5)),
            ..ClientConfig::default()
        };
        let options = config.tcp_options();
        assert_eq!(options.read_buffer_size, 64);
        assert_eq!(options.read_timeout, Some(Duration::from_secs(5)));
        assert!(options.connect_timeout.is_none());
    }

    #[test]
    fn test_credentials_defaults() {
        let creds = Credentials::new("bot", "13579");
        assert_eq!(creds.room_id, "null");
        assert_eq!(creds.language, "python");
    }

    #[test]
    fn test_login_command_ignores_room_and_language() {
        let creds = Credentials::new("test", "key123")
            .with_room_id("room-7")
            .with_language("rust");
        let cmd = creds.login_command().unwrap();
        assert_eq!(cmd.to_wire(), "REGISTER<<test:key123");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = ClientConfig::from_json(r#"{ "host": "127.0.0.1" }"#).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.inbound_framing, Framing::None);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_rejects_bad_types() {
        let err = ClientConfig::from_json(r#"{ "port": "three thousand" }"#).unwrap_err();
        assert!(matches!(err, crate::ClientError::Config(_)));
    }

    #[test]
    fn test_credentials_deserialize_with_defaults() {
        let creds: Credentials =
            serde_json::from_str(r#"{ "server_name": "a", "server_key": "b" }"#).unwrap();
        assert_eq!(creds, Credentials::new("a", "b"));
    }
}
