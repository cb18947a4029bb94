//! Integration tests for the TCP transport.
//!
//! Each test binds a real listener on `127.0.0.1:0`, lets the OS pick the
//! port, and drives the client side through [`TcpConnection`].

use std::sync::Arc;
use std::time::Duration;

use codewars_transport::{Connection, TcpConnection, TcpOptions, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Binds a listener and connects a `TcpConnection` to it.
/// Returns the client connection and the server side of the socket.
async fn connected_pair(options: TcpOptions) -> (TcpConnection, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let port = listener.local_addr().unwrap().port();

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("should accept");
        stream
    });
    let conn = TcpConnection::connect("127.0.0.1", port, options)
        .await
        .expect("should connect");
    let server = accept.await.expect("accept task should complete");
    (conn, server)
}

#[tokio::test]
async fn test_send_and_receive_bytes() {
    let (conn, mut server) = connected_pair(TcpOptions::default()).await;
    assert!(conn.id().into_inner() > 0);
    assert_eq!(conn.peer_addr(), server.local_addr().unwrap());
    assert_eq!(conn.local_addr(), server.peer_addr().unwrap());

    conn.send(b"SERVER_PING<<null").await.expect("send should succeed");
    let mut buf = [0u8; 17];
    server.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"SERVER_PING<<null");

    server.write_all(b"SERVER_MESSAGE<<hi").await.unwrap();
    let received = conn
        .recv()
        .await
        .expect("recv should succeed")
        .expect("should have data");
    assert_eq!(received, b"SERVER_MESSAGE<<hi");
}

#[tokio::test]
async fn test_recv_is_capped_at_read_buffer_size() {
    let options = TcpOptions {
        read_buffer_size: 8,
        ..TcpOptions::default()
    };
    let (conn, mut server) = connected_pair(options).await;

    server.write_all(b"0123456789abcdef").await.unwrap();
    let first = conn.recv().await.unwrap().unwrap();
    assert!(first.len() <= 8);
    assert_eq!(&first[..], &b"0123456789abcdef"[..first.len()]);
}

#[tokio::test]
async fn test_recv_returns_none_on_peer_close() {
    let (conn, server) = connected_pair(TcpOptions::default()).await;
    drop(server);

    let result = conn.recv().await.expect("recv should not error");
    assert!(result.is_none(), "should return None on peer close");
}

#[tokio::test]
async fn test_close_is_idempotent_and_blocks_further_use() {
    let (conn, mut server) = connected_pair(TcpOptions::default()).await;

    conn.close().await.expect("first close");
    conn.close().await.expect("second close is a no-op");
    assert!(conn.is_closed());

    let err = conn.send(b"TURN_REPLY<<pass").await.unwrap_err();
    assert!(err.is_closed());
    let err = conn.recv().await.unwrap_err();
    assert!(err.is_closed());

    // The peer sees EOF once we have shut down.
    let mut buf = Vec::new();
    server.read_to_end(&mut buf).await.unwrap();
    assert!(buf.is_empty());
}

#[tokio::test]
async fn test_close_wakes_a_blocked_reader() {
    let (conn, _server) = connected_pair(TcpOptions::default()).await;
    let conn = Arc::new(conn);

    let reader = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move { conn.recv().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    conn.close().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), reader)
        .await
        .expect("reader should wake up")
        .expect("task should not panic");
    assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
}

#[tokio::test]
async fn test_read_timeout_surfaces_as_timed_out() {
    let options = TcpOptions {
        read_timeout: Some(Duration::from_millis(50)),
        ..TcpOptions::default()
    };
    let (conn, _server) = connected_pair(options).await;

    let err = conn.recv().await.unwrap_err();
    assert!(matches!(err, TransportError::TimedOut("read")));
    assert!(!conn.is_closed());
}

#[tokio::test]
async fn test_connect_refused_is_a_connect_error() {
    // Grab a free port, then release it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result =
        TcpConnection::connect("127.0.0.1", port, TcpOptions::default()).await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
}
