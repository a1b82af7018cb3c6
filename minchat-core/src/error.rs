//! Domain-specific error types for the chat session engine.
//!
//! All fallible operations return `Result<T, ChatError>`.
//! No panics on bad server input — every error is typed, and the reconnect
//! driver decides per class whether a failure is worth another attempt.

use std::time::Duration;
use thiserror::Error;

use crate::watchdog::TaskKind;

/// The canonical error type for the chat client.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Connection Errors ────────────────────────────────────────
    /// The TCP connection could not be established or maintained.
    #[error("cannot reach chat server: {0}")]
    Connect(#[from] std::io::Error),

    /// The session went silent or the server hung up mid-stream.
    #[error("connectivity lost: {0}")]
    ConnectivityLost(LostCause),

    // ── Authentication Errors ────────────────────────────────────
    /// The server answered the token line with the `null` sentinel.
    ///
    /// This is an expected outcome, not a transport failure; it is never
    /// retried automatically.
    #[error("server rejected the token")]
    TokenRejected,

    /// An auth or registration reply was not the JSON object we expected.
    #[error("malformed server reply: {0}")]
    BadReply(#[from] serde_json::Error),

    // ── Protocol Errors ──────────────────────────────────────────
    /// A received line was not valid UTF-8.
    #[error("invalid utf-8 on the wire: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A line exceeded the codec's length cap without a terminator.
    #[error("line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },

    // ── Credential Store Errors ──────────────────────────────────
    /// No token has been saved yet; registration must run first.
    #[error("no stored token; register first")]
    TokenMissing,

    /// The token store failed to read or write the credential.
    #[error("token storage error: {0}")]
    Storage(std::io::Error),

    // ── Coordination Errors ──────────────────────────────────────
    /// A collaborator sink or queue was dropped while the session ran.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// A connection-state machine was driven out of order.
    #[error("invalid link-state transition: {0}")]
    InvalidTransition(&'static str),
}

// ── LostCause ─────────────────────────────────────────────────────

/// Why an established session was declared dead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LostCause {
    /// A task reported no activity within its deadline and the watchdog
    /// ended the session.
    #[error("{task} task stalled for {timeout:?}")]
    Stalled { task: TaskKind, timeout: Duration },

    /// The server closed its end of the stream.
    #[error("server closed the stream")]
    StreamClosed,
}

impl ChatError {
    /// `true` when this failure belongs to the classes the reconnect
    /// driver is allowed to swallow and retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChatError::Connect(_) | ChatError::ConnectivityLost(_) | ChatError::BadReply(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ChatError::TokenRejected;
        assert!(e.to_string().contains("rejected"));

        let e = ChatError::LineTooLong { len: 1000, max: 500 };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));

        let e = ChatError::ConnectivityLost(LostCause::Stalled {
            task: TaskKind::Read,
            timeout: Duration::from_secs(5),
        });
        assert!(e.to_string().contains("read"));
        assert!(e.to_string().contains("5"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e: ChatError = io_err.into();
        assert!(matches!(e, ChatError::Connect(_)));
    }

    #[test]
    fn transient_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(ChatError::Connect(io_err).is_transient());
        assert!(ChatError::ConnectivityLost(LostCause::StreamClosed).is_transient());
        assert!(!ChatError::TokenRejected.is_transient());
        assert!(!ChatError::TokenMissing.is_transient());
        assert!(!ChatError::ChannelClosed("messages sink").is_transient());
    }
}
