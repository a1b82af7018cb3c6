//! TCP connection lease for a single chat session.
//!
//! [`Connection`] owns exactly one socket for its lifetime. The socket is
//! released on every exit path — normal return, error, or cancellation —
//! because both halves close the stream when dropped; `OwnedWriteHalf`
//! additionally shuts the write side down. A connect that never succeeded
//! owns nothing, so there is nothing to release.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

use crate::codec::LineCodec;
use crate::error::ChatError;
use crate::message::Outbound;

// ── ConnectionInfo ───────────────────────────────────────────────

/// Host and port of the chat server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Connection ───────────────────────────────────────────────────

/// A live socket to the chat server, framed with [`LineCodec`].
///
/// Used whole during the handshake, then [`split`](Self::split) into its
/// read and write capabilities for the session loops.
#[derive(Debug)]
pub struct Connection {
    reader: MessageReader,
    writer: MessageWriter,
}

impl Connection {
    /// Open a TCP connection to the server.
    ///
    /// Refusal, DNS failure, and OS-level timeouts all surface as
    /// [`ChatError::Connect`].
    pub async fn open(info: &ConnectionInfo) -> Result<Self, ChatError> {
        debug!(addr = %info, "open connection");
        let stream = TcpStream::connect((info.host.as_str(), info.port)).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: MessageReader {
                inner: FramedRead::new(read_half, LineCodec),
            },
            writer: MessageWriter {
                inner: FramedWrite::new(write_half, LineCodec),
            },
        })
    }

    /// Read one message line; `None` means the server closed the stream.
    pub async fn read_line(&mut self) -> Result<Option<String>, ChatError> {
        self.reader.next_line().await
    }

    /// Write one outbound frame and flush it.
    pub async fn send(&mut self, frame: Outbound) -> Result<(), ChatError> {
        self.writer.send(frame).await
    }

    /// Split the lease into its read and write capabilities.
    pub fn split(self) -> (MessageReader, MessageWriter) {
        (self.reader, self.writer)
    }
}

// ── MessageReader / MessageWriter ────────────────────────────────

/// The read capability of a [`Connection`].
#[derive(Debug)]
pub struct MessageReader {
    inner: FramedRead<OwnedReadHalf, LineCodec>,
}

impl MessageReader {
    /// Next message line off the wire; `None` on end-of-stream.
    ///
    /// Blocks until a full line (terminator included) is available.
    pub async fn next_line(&mut self) -> Result<Option<String>, ChatError> {
        let line = self.inner.next().await.transpose()?;
        if let Some(text) = &line {
            debug!(%text, "receive");
        }
        Ok(line)
    }
}

/// The write capability of a [`Connection`].
#[derive(Debug)]
pub struct MessageWriter {
    inner: FramedWrite<OwnedWriteHalf, LineCodec>,
}

impl MessageWriter {
    /// Write one frame and flush it to the socket.
    pub async fn send(&mut self, frame: Outbound) -> Result<(), ChatError> {
        debug!(?frame, "send");
        self.inner.send(frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn connection_info_display() {
        let info = ConnectionInfo::new("chat.example.org", 5050);
        assert_eq!(info.to_string(), "chat.example.org:5050");
        assert_eq!(info.host(), "chat.example.org");
        assert_eq!(info.port(), 5050);
    }

    #[tokio::test]
    async fn open_refused_is_connect_error() {
        // Bind then drop a listener so the port is known-closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let info = ConnectionInfo::new("127.0.0.1", port);
        let err = Connection::open(&info).await.unwrap_err();
        assert!(matches!(err, ChatError::Connect(_)));
    }

    #[tokio::test]
    async fn reads_greeting_and_detects_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"Hello there!\n").await.unwrap();
            // Drop closes the stream.
        });

        let info = ConnectionInfo::new("127.0.0.1", port);
        let mut conn = Connection::open(&info).await.unwrap();
        assert_eq!(
            conn.read_line().await.unwrap(),
            Some("Hello there!".to_string())
        );
        assert_eq!(conn.read_line().await.unwrap(), None);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn split_halves_carry_traffic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut seen = Vec::new();
            let mut buf = [0u8; 64];
            while seen != b"ping\n\n" {
                let n = tokio::io::AsyncReadExt::read(&mut sock, &mut buf).await.unwrap();
                assert!(n > 0, "client closed before the frame arrived");
                seen.extend_from_slice(&buf[..n]);
            }
            sock.write_all(b"pong\n").await.unwrap();
        });

        let info = ConnectionInfo::new("127.0.0.1", port);
        let conn = Connection::open(&info).await.unwrap();
        let (mut reader, mut writer) = conn.split();

        writer.send(Outbound::Message("ping".to_string())).await.unwrap();
        assert_eq!(reader.next_line().await.unwrap(), Some("pong".to_string()));

        server.await.unwrap();
    }
}
