//! Message vocabulary shared by the codec, session loops, and adapters.

use chrono::{DateTime, Local};

// ── InboundMessage ───────────────────────────────────────────────

/// A single server-originated chat line, timestamped at receipt.
///
/// Delivered in arrival order to both the display and persistence sinks;
/// formatting is the sinks' concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Payload text with the line terminator already stripped.
    pub text: String,
    /// When the line was read off the socket.
    pub received_at: DateTime<Local>,
}

impl InboundMessage {
    /// Wrap a decoded line, stamping it with the current local time.
    pub fn received(text: String) -> Self {
        Self {
            text,
            received_at: Local::now(),
        }
    }
}

// ── Outbound ─────────────────────────────────────────────────────

/// Everything the client ever writes to the socket.
///
/// The wire distinguishes handshake lines (single line feed) from
/// application messages (payload plus a blank line as the end-of-message
/// marker). A keep-alive is an application message with no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Handshake traffic: token, username, registration request.
    Line(String),
    /// A chat message, terminated by the blank-line marker.
    Message(String),
    /// Framing-only message proving the link is still writable.
    KeepAlive,
}
