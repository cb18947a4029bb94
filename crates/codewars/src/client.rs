//! `ProtocolClient`: one logged-in connection to the switch.
//!
//! Construction opens the socket and performs the login handshake inline,
//! so a `ProtocolClient` that exists has already sent `REGISTER`. After
//! that every call is a single request on the wire: there is no queue, no
//! retry and no game state. The caller owns the sequencing of a game.
//!
//! The client is either connected or closed. Closing is final, and every
//! call after it fails with a "connection closed" error.

use std::fmt;
use std::net::SocketAddr;

use codewars_protocol::{Command, FrameBuffer, LoginResponse};
use codewars_transport::{
    Connection, ConnectionId, TcpConnection, TransportError,
};
use tokio::sync::Mutex;

use crate::{ClientConfig, ClientError, Credentials};

/// Builder for configuring and connecting a [`ProtocolClient`].
///
/// # Example
///
/// ```rust,no_run
/// use codewars::prelude::*;
///
/// # async fn run() -> Result<(), ClientError> {
/// let client = ProtocolClient::builder("my-bot", "13579")
///     .host("127.0.0.1")
///     .port(3000)
///     .connect()
///     .await?;
/// client.ping().await?;
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct ProtocolClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
}

impl ProtocolClientBuilder {
    /// Creates a builder with default settings.
    pub fn new(
        server_name: impl Into<String>,
        server_key: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials::new(server_name, server_key),
            config: ClientConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the switch host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the switch port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the room id. It is not sent to the switch.
    pub fn room_id(mut self, room_id: impl Into<String>) -> Self {
        self.credentials.room_id = room_id.into();
        self
    }

    /// Sets the language. It is not sent to the switch.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.credentials.language = language.into();
        self
    }

    /// Connects and logs in.
    pub async fn connect(self) -> Result<ProtocolClient, ClientError> {
        ProtocolClient::connect(self.credentials, self.config).await
    }
}

/// A connection to the switch, logged in at construction.
///
/// All methods take `&self`, so one client can be shared behind an `Arc`
/// by a reading task and a writing task. Writes never interleave, and a
/// `close` from either side wakes the other.
pub struct ProtocolClient {
    conn: TcpConnection,
    credentials: Credentials,
    config: ClientConfig,
    login_response: Vec<u8>,
    login_status: LoginResponse,
    /// Bytes read by `next_message` that don't yet form a whole message.
    inbox: Mutex<FrameBuffer>,
}

impl fmt::Debug for ProtocolClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("id", &self.conn.id())
            .field("peer", &self.conn.peer_addr())
            .field("server", &self.credentials.server_name)
            .field("login_status", &self.login_status)
            .field("closed", &self.conn.is_closed())
            .finish_non_exhaustive()
    }
}

impl ProtocolClient {
    /// Creates a new builder.
    pub fn builder(
        server_name: impl Into<String>,
        server_key: impl Into<String>,
    ) -> ProtocolClientBuilder {
        ProtocolClientBuilder::new(server_name, server_key)
    }

    /// Opens a connection to the configured switch and logs in.
    ///
    /// The login is `REGISTER<<{server_name}:{server_key}`, followed by one
    /// read of up to `read_buffer_size` bytes which is kept as the login
    /// response. The reply is classified but, unless
    /// `require_login_confirmation` is set, never fails the call: an empty,
    /// late or negative reply still yields a connected client.
    ///
    /// # Errors
    /// - connection failure: [`TransportError::Connect`] or `TimedOut`,
    ///   with no socket left open;
    /// - a server name or key containing `<<`;
    /// - [`ClientError::LoginRejected`] when confirmation is required and
    ///   the switch sent `DISCONNECT_BOT_REMOTE`.
    pub async fn connect(
        credentials: Credentials,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let login = credentials.login_command()?;
        let login_bytes = config.outbound_framing.encode(&login)?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            server = %credentials.server_name,
            "connecting to switch"
        );
        let conn = TcpConnection::connect(
            &config.host,
            config.port,
            config.tcp_options(),
        )
        .await?;

        match Self::login(&conn, &login_bytes).await {
            Ok(raw) => {
                let status = LoginResponse::classify(&raw);
                if let LoginResponse::Rejected { reason } = &status {
                    tracing::warn!(id = %conn.id(), %reason, "login rejected");
                    if config.require_login_confirmation {
                        conn.close().await?;
                        return Err(ClientError::LoginRejected(reason.clone()));
                    }
                }
                tracing::info!(id = %conn.id(), status = ?status, "logged in");

                Ok(Self {
                    inbox: Mutex::new(FrameBuffer::with_max_message_len(
                        config.inbound_framing,
                        config.max_message_len,
                    )),
                    conn,
                    credentials,
                    config,
                    login_response: raw,
                    login_status: status,
                })
            }
            Err(e) => {
                conn.close().await?;
                Err(e)
            }
        }
    }

    /// Sends the login command and reads the single response chunk.
    async fn login(
        conn: &TcpConnection,
        login_bytes: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        conn.send(login_bytes).await?;
        tracing::debug!(id = %conn.id(), "sent login");

        let raw = match conn.recv().await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(id = %conn.id(), "switch closed before replying to login");
                Vec::new()
            }
            Err(TransportError::TimedOut(_)) => {
                tracing::warn!(id = %conn.id(), "no login response before read timeout");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            id = %conn.id(),
            response = %String::from_utf8_lossy(&raw),
            "login response"
        );
        Ok(raw)
    }

    // -----------------------------------------------------------------------
    // Raw primitives
    // -----------------------------------------------------------------------

    /// Sends `command` exactly as given.
    ///
    /// No terminator is appended; include one in `command` if the switch
    /// needs it. Partial writes are retried until every byte is out.
    pub async fn send(&self, command: &str) -> Result<(), ClientError> {
        self.conn.send(command.as_bytes()).await?;
        Ok(())
    }

    /// Sends a typed command, terminated per `outbound_framing`.
    pub async fn send_command(
        &self,
        command: &Command,
    ) -> Result<(), ClientError> {
        let bytes = self.config.outbound_framing.encode(command)?;
        self.conn.send(&bytes).await?;
        tracing::debug!(id = %self.conn.id(), %command, "sent command");
        Ok(())
    }

    /// Performs one read and returns whatever arrived, up to
    /// `read_buffer_size` bytes.
    ///
    /// No framing is applied: the result may hold part of a message or
    /// several messages. Bytes left over from
    /// [`next_message`](Self::next_message) are returned first, without
    /// touching the socket.
    ///
    /// # Errors
    /// "connection closed" if the client was closed or the peer hung up
    /// (the client is closed in the latter case too).
    pub async fn receive(&self) -> Result<Vec<u8>, ClientError> {
        self.ensure_open()?;
        {
            let mut inbox = self.inbox.lock().await;
            if !inbox.is_empty() {
                return Ok(inbox.take_all().to_vec());
            }
        }
        self.read_chunk().await
    }

    /// Returns the next complete message, reading as much as needed.
    ///
    /// Under `Framing::None` each read chunk is one message; under
    /// `Framing::Line` messages end at `\n` and are reassembled across
    /// reads.
    ///
    /// # Errors
    /// As [`receive`](Self::receive), plus
    /// [`ProtocolError::InvalidMessage`](codewars_protocol::ProtocolError)
    /// for bytes that are not `TAG<<PAYLOAD` and `MessageTooLong` for an
    /// unterminated line past `max_message_len`.
    pub async fn next_message(&self) -> Result<Command, ClientError> {
        self.ensure_open()?;
        let mut inbox = self.inbox.lock().await;
        loop {
            if let Some(frame) = inbox.next_frame()? {
                let command = Command::parse(&frame)?;
                tracing::debug!(id = %self.conn.id(), %command, "received command");
                return Ok(command);
            }
            let chunk = match self.read_chunk().await {
                Ok(chunk) => chunk,
                Err(e) => {
                    if self.conn.is_closed() && !inbox.is_empty() {
                        tracing::debug!(
                            id = %self.conn.id(),
                            bytes = inbox.len(),
                            "dropping partial message on close"
                        );
                        inbox.take_all();
                    }
                    return Err(e);
                }
            };
            inbox.push(&chunk);
        }
    }

    /// One read; a peer hang-up closes the client.
    async fn read_chunk(&self) -> Result<Vec<u8>, ClientError> {
        match self.conn.recv().await? {
            Some(chunk) => Ok(chunk),
            None => {
                tracing::info!(id = %self.conn.id(), "switch closed the connection");
                self.conn.close().await?;
                Err(TransportError::ConnectionClosed(
                    "closed by peer".into(),
                )
                .into())
            }
        }
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.conn.is_closed() {
            return Err(TransportError::ConnectionClosed(
                "client is closed".into(),
            )
            .into());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Sends `SERVER_PING<<null`.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.send_command(&Command::ping()).await
    }

    /// Sends `GAME_INITIALIZE<<go`. There is no way to decline.
    pub async fn accept_challenge(&self) -> Result<(), ClientError> {
        self.send_command(&Command::accept_challenge()).await
    }

    /// Sends `PLAYCARDS_REPLY<<{reply}`.
    pub async fn send_cards(&self, reply: &str) -> Result<(), ClientError> {
        self.send_command(&Command::playcards_reply(reply)?).await
    }

    /// Sends `TURN_REPLY<<{reply}`.
    pub async fn turn_reply(&self, reply: &str) -> Result<(), ClientError> {
        self.send_command(&Command::turn_reply(reply)?).await
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Closes the connection. Calling it again does nothing.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.conn.close().await?;
        Ok(())
    }

    /// Alias for [`close`](Self::close).
    pub async fn kill(&self) -> Result<(), ClientError> {
        self.close().await
    }

    /// Alias for [`close`](Self::close).
    pub async fn destroy(&self) -> Result<(), ClientError> {
        self.close().await
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The raw bytes the switch sent in answer to the login, verbatim.
    pub fn login_response(&self) -> &[u8] {
        &self.login_response
    }

    /// What the login response says.
    pub fn login_status(&self) -> &LoginResponse {
        &self.login_status
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }
}
