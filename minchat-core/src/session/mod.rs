//! Session supervisor: one connection lease, four cooperating loops.
//!
//! [`ChatSession::run_once`] opens the lease, authenticates, then races
//! the read loop, send loop, keep-alive loop, and watchdog under a single
//! `tokio::select!`. The first loop to finish decides the session's fate;
//! the losers are dropped on the spot, which also drops the socket halves
//! and releases the lease. Status events go out for every per-direction
//! lifecycle transition, and `Closed` is guaranteed for both directions on
//! every exit path.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::auth::{self, Token};
use crate::error::{ChatError, LostCause};
use crate::message::{InboundMessage, Outbound};
use crate::network::{Connection, ConnectionInfo, MessageReader, MessageWriter};
use crate::state::{Direction, Identity, StatusBoard, StatusEvent};
use crate::watchdog::{self, TaskKind, WatchdogHandle};

/// How long any single read, send, or enqueue may go without progress
/// before its task reports an elapsed deadline.
pub const DEFAULT_ACTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often the keep-alive loop proves the link when the user is idle.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Outbound messages buffered ahead of the send loop.
const OUTBOUND_QUEUE_DEPTH: usize = 100;

// ── SessionConfig ────────────────────────────────────────────────

/// Tunables for one chat session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The chat server to connect to.
    pub server: ConnectionInfo,
    /// Per-operation deadline for the session loops and the handshake.
    pub activity_timeout: Duration,
    /// Interval between framing-only keep-alive messages.
    pub keepalive_interval: Duration,
}

impl SessionConfig {
    pub fn new(server: ConnectionInfo) -> Self {
        Self {
            server,
            activity_timeout: DEFAULT_ACTIVITY_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

// ── SessionSinks ─────────────────────────────────────────────────

/// Outward-facing event streams fed by the engine.
///
/// `messages` and `history` receive the same inbound stream independently
/// and in arrival order; both are load-bearing, so a dropped receiver ends
/// the engine with [`ChatError::ChannelClosed`]. `status` is best-effort.
#[derive(Debug, Clone)]
pub struct SessionSinks {
    pub messages: mpsc::UnboundedSender<InboundMessage>,
    pub history: mpsc::UnboundedSender<InboundMessage>,
    pub status: mpsc::UnboundedSender<StatusEvent>,
}

impl SessionSinks {
    fn deliver(&self, message: InboundMessage) -> Result<(), ChatError> {
        self.messages
            .send(message.clone())
            .map_err(|_| ChatError::ChannelClosed("messages sink"))?;
        self.history
            .send(message)
            .map_err(|_| ChatError::ChannelClosed("history sink"))?;
        Ok(())
    }
}

// ── SessionHandle ────────────────────────────────────────────────

/// Producer half of the outbound queue, held by the user-facing adapter.
///
/// Messages are consumed exactly once, in FIFO order, by the send loop of
/// whichever session is currently connected. Dropping every handle closes
/// the queue and lets the engine wind down cleanly.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Outbound>,
}

impl SessionHandle {
    /// Queue one chat message for submission.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), ChatError> {
        self.tx
            .send(Outbound::Message(text.into()))
            .await
            .map_err(|_| ChatError::ChannelClosed("outbound queue"))
    }
}

// ── ChatSession ──────────────────────────────────────────────────

/// The session engine. One instance outlives many connection leases; the
/// reconnect driver calls [`run_once`](Self::run_once) repeatedly.
#[derive(Debug)]
pub struct ChatSession {
    config: SessionConfig,
    token: Token,
    sinks: SessionSinks,
    /// Keep-alive producer; weak so that user handles alone decide when
    /// the queue closes.
    outbound_tx: mpsc::WeakSender<Outbound>,
    outbound_rx: mpsc::Receiver<Outbound>,
}

impl ChatSession {
    /// Build a session engine and the handle its callers submit through.
    pub fn new(config: SessionConfig, token: Token, sinks: SessionSinks) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let session = Self {
            config,
            token,
            sinks,
            outbound_tx: tx.downgrade(),
            outbound_rx: rx,
        };
        (session, SessionHandle { tx })
    }

    /// Run one full session: connect, authenticate, stream until a fatal
    /// signal, tear down.
    ///
    /// `Ok(())` means the outbound source closed and the engine is done
    /// for good. Every error reflects the fate of this lease; the
    /// reconnect driver decides which ones are worth another attempt.
    /// `Closed` status is emitted for both directions on every exit path.
    pub async fn run_once(&mut self) -> Result<(), ChatError> {
        let mut status = StatusBoard::new(self.sinks.status.clone());
        let result = self.drive(&mut status).await;
        if matches!(result, Err(ChatError::TokenRejected)) {
            status.token_rejected();
        }
        status.close_all();
        match &result {
            Ok(()) => info!("session finished: outbound source closed"),
            Err(error) => warn!(%error, "session ended"),
        }
        result
    }

    async fn drive(&mut self, status: &mut StatusBoard) -> Result<(), ChatError> {
        status.initiated(Direction::Send)?;
        status.initiated(Direction::Read)?;

        let mut conn = Connection::open(&self.config.server).await?;
        status.established(Direction::Send)?;
        status.established(Direction::Read)?;

        let timeout = self.config.activity_timeout;
        let nickname = time::timeout(timeout, handshake(&mut conn, &self.token))
            .await
            .map_err(|_| {
                ChatError::ConnectivityLost(LostCause::Stalled {
                    task: TaskKind::Handshake,
                    timeout,
                })
            })??;
        info!(%nickname, server = %self.config.server, "authorized");
        status.identity(Identity::Nick(nickname));

        let (dog, mut watchdog_rx) = WatchdogHandle::channel();
        dog.alive("authorization done");

        let (mut reader, mut writer) = conn.split();
        tokio::select! {
            result = read_loop(&mut reader, &self.sinks, &dog, timeout) => result,
            result = send_loop(&mut writer, &mut self.outbound_rx, &dog, timeout) => result,
            result = keepalive_loop(&self.outbound_tx, &dog, self.config.keepalive_interval, timeout) => result,
            result = watchdog::watch_connection(&mut watchdog_rx) => result,
        }
    }
}

/// Consume the greeting line, then run the token handshake.
async fn handshake(conn: &mut Connection, token: &Token) -> Result<String, ChatError> {
    let greeting = conn.read_line().await?.ok_or_else(|| {
        ChatError::Connect(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "server closed the stream before greeting",
        ))
    })?;
    debug!(%greeting, "server greeting");
    auth::authenticate(conn, token).await
}

// ── Session loops ────────────────────────────────────────────────

/// Pull message lines off the wire and fan them out to the sinks.
///
/// A timed-out read is reported to the watchdog and retried; only the
/// watchdog may turn repeated silence into a session-ending decision.
/// End-of-stream is fatal here.
async fn read_loop(
    reader: &mut MessageReader,
    sinks: &SessionSinks,
    dog: &WatchdogHandle,
    timeout: Duration,
) -> Result<(), ChatError> {
    loop {
        match time::timeout(timeout, reader.next_line()).await {
            Err(_) => dog.elapsed(TaskKind::Read, timeout),
            Ok(Ok(Some(line))) => {
                sinks.deliver(InboundMessage::received(line))?;
                dog.alive("new message in chat");
            }
            Ok(Ok(None)) => return Err(ChatError::ConnectivityLost(LostCause::StreamClosed)),
            Ok(Err(error)) => return Err(error),
        }
    }
}

/// Drain the outbound queue onto the wire, one frame at a time.
///
/// Keep-alive frames ride the same queue and the same framing, so every
/// successful write, payload or not, counts as proof the link is alive.
async fn send_loop(
    writer: &mut MessageWriter,
    outbound: &mut mpsc::Receiver<Outbound>,
    dog: &WatchdogHandle,
    timeout: Duration,
) -> Result<(), ChatError> {
    while let Some(frame) = outbound.recv().await {
        let proof = match &frame {
            Outbound::KeepAlive => "keep-alive sent",
            _ => "message sent",
        };
        match time::timeout(timeout, writer.send(frame)).await {
            Err(_) => dog.elapsed(TaskKind::Send, timeout),
            Ok(Ok(())) => dog.alive(proof),
            Ok(Err(error)) => return Err(error),
        }
    }
    Ok(())
}

/// Periodically enqueue a framing-only message so the link stays
/// observable while the user is idle. The first tick fires immediately.
///
/// The send loop reports the actual wire write; this loop only raises a
/// deadline when even enqueueing stalls past the timeout.
async fn keepalive_loop(
    outbound: &mpsc::WeakSender<Outbound>,
    dog: &WatchdogHandle,
    interval: Duration,
    timeout: Duration,
) -> Result<(), ChatError> {
    let mut ticker = time::interval(interval);
    loop {
        ticker.tick().await;
        let Some(tx) = outbound.upgrade() else {
            // Every user handle is gone; the session is winding down.
            return Ok(());
        };
        match time::timeout(timeout, tx.send(Outbound::KeepAlive)).await {
            Err(_) => dog.elapsed(TaskKind::KeepAlive, timeout),
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Ok(()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
