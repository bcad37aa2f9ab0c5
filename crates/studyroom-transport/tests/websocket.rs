//! Integration tests for the WebSocket transport.
//!
//! These bind a real listener on an OS-assigned port and talk to it with
//! both a raw tokio-tungstenite client and the crate's own `connect`.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use studyroom_transport::{Connection, Transport, WebSocketTransport, connect};
    use tokio_tungstenite::tungstenite::Message;

    async fn bind_local() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");
        (transport, format!("ws://{addr}"))
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, url) = bind_local().await;
        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let (mut client_ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");
        assert!(server_conn.id().into_inner() > 0);

        server_conn
            .send(b"hello from server")
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from server");

        client_ws
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (mut transport, url) = bind_local().await;
        let server_handle = tokio::spawn(async move { transport.accept().await.unwrap() });

        let (mut client_ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_close_after_peer_closed_is_ok() {
        let (mut transport, url) = bind_local().await;
        let server_handle = tokio::spawn(async move { transport.accept().await.unwrap() });

        let (mut client_ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();
        assert!(server_conn.recv().await.expect("recv should not error").is_none());
        assert!(server_conn.recv().await.expect("still no error").is_none());

        server_conn.close().await.expect("first close");
        server_conn.close().await.expect("second close");
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (mut transport, url) = bind_local().await;
        let server_handle = tokio::spawn(async move { transport.accept().await.unwrap() });

        let client = connect(&url).await.expect("connect should succeed");
        let server_conn = std::sync::Arc::new(server_handle.await.unwrap());

        // Park a receiver on the server side; nothing will arrive for it yet.
        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), server_conn.send(b"ping"))
            .await
            .expect("send must not wait on recv")
            .unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"ping");

        client.send(b"pong").await.unwrap();
        let echoed = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(echoed, b"pong");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let (transport, url) = bind_local().await;
        drop(transport);

        let err = connect(&url).await.err().expect("nothing is listening");
        assert!(err.to_string().contains(&url));
    }
}
