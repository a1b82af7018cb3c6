//! # minchat-core
//!
//! Session engine for a resilient line-oriented chat client.
//!
//! This crate contains:
//! - **Codec**: `LineCodec` for the line-feed wire framing via `tokio_util`
//! - **Network**: `Connection`, the socket lease with split read/write capabilities
//! - **Auth**: token handshake, registration, and the `TokenStore` boundary
//! - **Watchdog**: typed liveness events and the session-failure decision
//! - **State**: per-direction link lifecycle and the status event stream
//! - **Session**: `ChatSession`, racing the read/send/keep-alive/watchdog loops
//! - **Reconnect**: `RetryPolicy` and the never-give-up backoff driver
//! - **Error**: `ChatError`, a typed `thiserror`-based hierarchy
//!
//! Display, history persistence, credential files, and CLI wiring live in
//! the `minchat-client` binary; this crate only speaks channels and traits
//! to them.

pub mod auth;
pub mod codec;
pub mod error;
pub mod message;
pub mod network;
pub mod reconnect;
pub mod session;
pub mod state;
pub mod watchdog;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use auth::{Token, TokenStore, authenticate, register};
pub use codec::{LineCodec, MAX_LINE_LENGTH};
pub use error::{ChatError, LostCause};
pub use message::{InboundMessage, Outbound};
pub use network::{Connection, ConnectionInfo, MessageReader, MessageWriter};
pub use reconnect::{RetryPolicy, run_with_backoff};
pub use session::{
    ChatSession, DEFAULT_ACTIVITY_TIMEOUT, DEFAULT_KEEPALIVE_INTERVAL, SessionConfig,
    SessionHandle, SessionSinks,
};
pub use state::{Direction, Identity, LinkState, StatusBoard, StatusEvent};
pub use watchdog::{TaskKind, WatchdogEvent, WatchdogHandle, watch_connection};
