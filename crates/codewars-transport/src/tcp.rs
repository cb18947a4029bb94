//! TCP connection to the switch, built on `tokio::net::TcpStream`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, watch};
use tokio::time;

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Size of a single read when none is configured.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Socket-level knobs for a [`TcpConnection`].
///
/// All timeouts default to `None`: operations wait as long as the socket
/// does.
#[derive(Debug, Clone)]
pub struct TcpOptions {
    /// Maximum number of bytes returned by one [`Connection::recv`].
    pub read_buffer_size: usize,
    /// Upper bound on establishing the connection.
    pub connect_timeout: Option<Duration>,
    /// Upper bound on a single read.
    pub read_timeout: Option<Duration>,
    /// Upper bound on writing one buffer in full.
    pub write_timeout: Option<Duration>,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// A single TCP connection.
///
/// The stream is split into independently locked halves so that a task
/// parked in [`recv`](Connection::recv) never holds up a writer. The
/// `closed` watch channel is the one source of truth for the lifecycle:
/// flipping it wakes every pending operation.
pub struct TcpConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    reader: Mutex<Option<OwnedReadHalf>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: watch::Sender<bool>,
    options: TcpOptions,
}

impl TcpConnection {
    /// Opens a connection to `host:port`.
    ///
    /// `host` may be a name or an address literal; name resolution
    /// failures surface as [`TransportError::Connect`]. Nothing is retried.
    pub async fn connect(
        host: &str,
        port: u16,
        options: TcpOptions,
    ) -> Result<Self, TransportError> {
        let stream = deadline(options.connect_timeout, "connect", async {
            TcpStream::connect((host, port))
                .await
                .map_err(TransportError::Connect)
        })
        .await?;
        Self::from_stream(stream, options)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(
        stream: TcpStream,
        mut options: TcpOptions,
    ) -> Result<Self, TransportError> {
        let peer_addr = stream.peer_addr().map_err(TransportError::Connect)?;
        let local_addr =
            stream.local_addr().map_err(TransportError::Connect)?;
        // Commands are a few dozen bytes; don't let Nagle sit on them.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        options.read_buffer_size = options.read_buffer_size.max(1);

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (read_half, write_half) = stream.into_split();
        let (closed, _) = watch::channel(false);
        tracing::debug!(%id, %peer_addr, "TCP connection established");

        Ok(Self {
            id,
            peer_addr,
            local_addr,
            reader: Mutex::new(Some(read_half)),
            writer: Mutex::new(Some(write_half)),
            closed,
            options,
        })
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Local address of the socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(TransportError::closed_locally());
        }

        // The writer lock is held for the whole buffer, so concurrent
        // sends go out back to back rather than interleaved.
        let write = async {
            let mut guard = self.writer.lock().await;
            let writer =
                guard.as_mut().ok_or_else(TransportError::closed_locally)?;
            writer
                .write_all(data)
                .await
                .map_err(TransportError::SendFailed)?;
            writer.flush().await.map_err(TransportError::SendFailed)
        };

        tokio::select! {
            res = deadline(self.options.write_timeout, "write", write) => {
                if res.is_ok() {
                    tracing::trace!(id = %self.id, bytes = data.len(), "sent");
                }
                res
            }
            _ = closed.changed() => Err(TransportError::closed_locally()),
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(TransportError::closed_locally());
        }

        let read = async {
            let mut guard = self.reader.lock().await;
            let reader =
                guard.as_mut().ok_or_else(TransportError::closed_locally)?;
            let mut buf = vec![0u8; self.options.read_buffer_size];
            let n = reader
                .read(&mut buf)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            buf.truncate(n);
            Ok::<_, TransportError>(buf)
        };

        tokio::select! {
            res = deadline(self.options.read_timeout, "read", read) => {
                let buf = res?;
                tracing::trace!(id = %self.id, bytes = buf.len(), "read");
                // A zero-length read is the peer's FIN.
                Ok((!buf.is_empty()).then_some(buf))
            }
            _ = closed.changed() => Err(TransportError::closed_locally()),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if self.closed.send_replace(true) {
            return Ok(());
        }

        // Pending operations observed the flag above and released their
        // locks, so both halves can be taken now.
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let shutdown = async {
                writer.shutdown().await.map_err(TransportError::SendFailed)
            };
            if let Err(e) =
                deadline(self.options.write_timeout, "shutdown", shutdown).await
            {
                tracing::debug!(id = %self.id, error = %e, "shutdown failed");
            }
        }
        drop(self.reader.lock().await.take());

        tracing::info!(id = %self.id, peer = %self.peer_addr, "connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Runs `fut`, failing with [`TransportError::TimedOut`] after `limit`.
async fn deadline<T>(
    limit: Option<Duration>,
    op: &'static str,
    fut: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    match limit {
        Some(limit) => time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::TimedOut(op))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_read_1024_bytes_without_timeouts() {
        let options = TcpOptions::default();
        assert_eq!(options.read_buffer_size, 1024);
        assert!(options.connect_timeout.is_none());
        assert!(options.read_timeout.is_none());
        assert!(options.write_timeout.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_times_out_pending_future() {
        let pending = std::future::pending::<Result<(), TransportError>>();
        let err = deadline(Some(Duration::from_millis(10)), "read", pending)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::TimedOut("read")));
    }

    #[tokio::test]
    async fn test_deadline_without_limit_passes_result_through() {
        let value = deadline(None, "read", async { Ok::<_, TransportError>(5) })
            .await
            .unwrap();
        assert_eq!(value, 5);
    }
}
