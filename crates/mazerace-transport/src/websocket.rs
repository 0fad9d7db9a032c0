//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};

use crate::{Connection, ConnectionId, Handshake, Transport, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// How long a client gets to finish the upgrade before it is dropped.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// `accept` only takes the TCP stream. The upgrade runs in
/// [`PendingConnection::complete`], so a client that never sends its
/// request holds up nobody but itself.
pub struct WebSocketTransport {
    listener: TcpListener,
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        })
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Returns the address the listener is bound to. Useful after
    /// binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Pending = PendingConnection;
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Pending, Self::Error> {
        let (stream, addr) = self.listener.accept().await.map_err(TransportError::Accept)?;
        Ok(PendingConnection {
            stream,
            addr,
            timeout: self.handshake_timeout,
        })
    }
}

/// A TCP client that has not upgraded yet.
pub struct PendingConnection {
    stream: TcpStream,
    addr: SocketAddr,
    timeout: Duration,
}

impl PendingConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Handshake for PendingConnection {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn complete(self) -> Result<Self::Connection, Self::Error> {
        let addr = self.addr;

        // The upgrade request path decides which endpoint serves the
        // connection, so capture it during the handshake.
        let mut path = String::from("/");
        let capture_path = |req: &Request,
                            resp: Response|
         -> Result<Response, ErrorResponse> {
            path = req.uri().path().to_owned();
            Ok(resp)
        };
        let upgrade = tokio_tungstenite::accept_hdr_async(self.stream, capture_path);
        let ws = match tokio::time::timeout(self.timeout, upgrade).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => return Err(TransportError::Handshake(format!("{addr}: {e}"))),
            Err(_) => {
                return Err(TransportError::Handshake(format!(
                    "{addr}: no upgrade within {:?}",
                    self.timeout
                )));
            }
        };

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, %path, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            path,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single WebSocket connection.
///
/// The socket is split into independently locked halves so a reader
/// parked in `recv` never stalls a writer.
pub struct WebSocketConnection {
    id: ConnectionId,
    path: String,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    fn write_error(&self, e: tungstenite::Error) -> TransportError {
        TransportError::Write {
            conn: self.id,
            reason: e.to_string(),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, text: &str) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(text.to_owned()))
            .await
            .map_err(|e| self.write_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.to_vec()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // tungstenite answers pings itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::Read {
                        conn: self.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        sink.close().await.map_err(|e| self.write_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn path(&self) -> &str {
        &self.path
    }
}
