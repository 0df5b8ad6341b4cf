//! Integration tests for the WebSocket transport against a real client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::net::SocketAddr;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use railyard_transport::{
        Connection, Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;

    const HANDSHAKE: Duration = Duration::from_secs(2);

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: SocketAddr) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on a free port and returns one accepted server connection
    /// plus the client end.
    async fn pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr();
        assert_ne!(addr.port(), 0);

        let server = tokio::spawn(async move {
            let pending = transport.accept().await.expect("should accept");
            WebSocketTransport::upgrade(pending, HANDSHAKE)
                .await
                .expect("should upgrade")
        });
        let client = connect_client(addr).await;
        let conn = server.await.expect("accept task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_websocket_send_and_receive_both_ways() {
        let (conn, mut client) = pair().await;
        assert!(conn.id().into_inner() > 0);

        conn.send(br#"{"payload":1}"#).await.expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "utf-8 payloads go out as text frames");
        assert_eq!(msg.into_data().as_ref(), br#"{"payload":1}"#);

        client
            .send(Message::Binary(b"from client".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv ok").expect("has data");
        assert_eq!(received, b"from client");

        client.send(Message::text("typed")).await.unwrap();
        let received = conn.recv().await.expect("recv ok").expect("has data");
        assert_eq!(received, b"typed");
    }

    #[tokio::test]
    async fn test_websocket_non_utf8_goes_out_as_binary() {
        let (conn, mut client) = pair().await;
        conn.send(&[0xff, 0x00]).await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
    }

    #[tokio::test]
    async fn test_websocket_send_not_blocked_by_pending_recv() {
        let (conn, mut client) = pair().await;
        let conn = std::sync::Arc::new(conn);

        let reader = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.recv().await })
        };
        // Let the reader park on the socket.
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), conn.send(b"tick"))
            .await
            .expect("send should not wait for recv")
            .unwrap();
        assert_eq!(client.next().await.unwrap().unwrap().into_data().as_ref(), b"tick");

        client.send(Message::text("done")).await.unwrap();
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got.as_deref(), Some(&b"done"[..]));
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (conn, mut client) = pair().await;
        client.send(Message::Close(None)).await.unwrap();
        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_websocket_send_after_close_is_connection_closed() {
        let (conn, _client) = pair().await;
        conn.close().await.expect("close should succeed");
        // A second close is a no-op.
        conn.close().await.expect("close is idempotent");
        let result = conn.send(b"late").await;
        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    }

    #[tokio::test]
    async fn test_websocket_accept_after_shutdown_fails() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        transport.shutdown().await.unwrap();
        let result = transport.accept().await;
        assert!(matches!(result, Err(TransportError::Shutdown)));
    }

    #[tokio::test]
    async fn test_websocket_accept_returns_before_handshake() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr();

        // Connects but never sends the HTTP upgrade.
        let _silent = TcpStream::connect(addr).await.unwrap();
        let pending = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("accept should not wait for the upgrade")
            .unwrap();
        assert_eq!(pending.peer_addr().ip(), addr.ip());

        let client = tokio::spawn(connect_client(addr));
        let next = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("a silent peer should not block the next accept")
            .unwrap();
        let conn = WebSocketTransport::upgrade(next, HANDSHAKE).await.unwrap();
        let _client = client.await.unwrap();
        assert!(conn.id().into_inner() > 0);
    }

    #[tokio::test]
    async fn test_websocket_upgrade_times_out_on_silent_peer() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let mut silent = TcpStream::connect(transport.local_addr()).await.unwrap();
        let pending = transport.accept().await.unwrap();
        let peer = pending.peer_addr();

        let result = WebSocketTransport::upgrade(pending, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(TransportError::HandshakeTimedOut(p)) if p == peer));

        // The socket was dropped, so the peer sees EOF.
        let mut buf = [0u8; 16];
        let read = tokio::time::timeout(Duration::from_secs(1), silent.read(&mut buf))
            .await
            .expect("peer should see the close");
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[tokio::test]
    async fn test_websocket_upgrade_rejects_non_http_peer() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let mut peer = TcpStream::connect(transport.local_addr()).await.unwrap();
        let pending = transport.accept().await.unwrap();

        tokio::io::AsyncWriteExt::write_all(&mut peer, b"hello there\r\n\r\n")
            .await
            .unwrap();
        let result = WebSocketTransport::upgrade(pending, HANDSHAKE).await;
        assert!(matches!(result, Err(TransportError::HandshakeFailed(_))));
    }
}
