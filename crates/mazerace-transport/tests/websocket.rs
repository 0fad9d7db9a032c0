//! Real listener, real client: frames in both directions, upgrade path
//! capture, and independent read and write halves.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use mazerace_transport::{
        Connection, Handshake, Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Accepts one client that connected on `path`, returning both ends.
    async fn pair(path: &str) -> (WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();
        let accepted = tokio::spawn(async move {
            let pending = transport.accept().await.unwrap();
            pending.complete().await.unwrap()
        });

        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
            .await
            .unwrap();
        (accepted.await.unwrap(), client)
    }

    async fn next_text(client: &mut Client) -> String {
        let msg = client.next().await.unwrap().unwrap();
        msg.into_text().unwrap().as_str().to_owned()
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (conn, mut client) = pair("/user-socket/").await;
        assert!(conn.id().get() > 0);
        assert_eq!(conn.path(), "/user-socket/");

        conn.send(r#"{"mode":"LOBBY"}"#).await.unwrap();
        assert_eq!(next_text(&mut client).await, r#"{"mode":"LOBBY"}"#);

        client.send(Message::text("left".to_owned())).await.unwrap();
        assert_eq!(conn.recv().await.unwrap().unwrap(), b"left");

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_binary_frames_are_accepted() {
        let (conn, mut client) = pair("/user-socket/").await;
        client.send(Message::binary(b"up".to_vec())).await.unwrap();
        assert_eq!(conn.recv().await.unwrap().unwrap(), b"up");
    }

    #[tokio::test]
    async fn test_client_close_ends_recv() {
        let (conn, mut client) = pair("/").await;
        assert_eq!(conn.path(), "/");

        client.send(Message::Close(None)).await.unwrap();
        assert!(conn.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parked_reader_does_not_block_writer() {
        let (conn, mut client) = pair("/user-socket/").await;
        let conn = Arc::new(conn);

        // The client never writes, so this reader stays parked.
        let reader = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.recv().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), conn.send("still writable"))
            .await
            .expect("send waited on the reader")
            .unwrap();
        assert_eq!(next_text(&mut client).await, "still writable");

        reader.abort();
    }

    #[tokio::test]
    async fn test_connections_get_distinct_ids() {
        let (a, _ca) = pair("/").await;
        let (b, _cb) = pair("/").await;
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_idle_client_does_not_hold_up_accept() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        // Connects over TCP but never sends an upgrade request.
        let _idle = TcpStream::connect(addr).await.unwrap();
        let idle_pending = transport.accept().await.unwrap();
        let idle = tokio::spawn(idle_pending.complete());

        let url = format!("ws://{addr}/user-socket/");
        let client = tokio::spawn(tokio_tungstenite::connect_async(url));
        let conn = tokio::time::timeout(Duration::from_secs(3), async {
            transport.accept().await.unwrap().complete().await.unwrap()
        })
        .await
        .expect("second client should not wait behind the idle one");
        assert_eq!(conn.path(), "/user-socket/");
        client.await.unwrap().unwrap();

        assert!(!idle.is_finished());
        idle.abort();
    }

    #[tokio::test]
    async fn test_handshake_times_out() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap()
            .with_handshake_timeout(Duration::from_millis(50));
        let addr = transport.local_addr().unwrap();

        let _idle = TcpStream::connect(addr).await.unwrap();
        let pending = transport.accept().await.unwrap();
        let err = tokio::time::timeout(Duration::from_secs(2), pending.complete())
            .await
            .expect("timeout should fire")
            .err()
            .expect("idle client must not upgrade");
        assert!(matches!(err, TransportError::Handshake(_)));
    }
}
