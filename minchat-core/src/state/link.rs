//! Per-direction connection state machine.
//!
//! Each session tracks its read side and its send side independently,
//! even though both ride one socket. Within one lease the lifecycle is
//! strictly monotonic:
//!
//! ```text
//!  Initiated ──► Established ──► Closed
//!      │                           ▲
//!      └───────────────────────────┘
//! ```
//!
//! A new lease restarts at `Initiated`. Transitions are validated and
//! return `Result` instead of panicking.

use crate::error::ChatError;

// ── Direction ────────────────────────────────────────────────────

/// The two independently tracked sides of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Send,
}

// ── LinkState ────────────────────────────────────────────────────

/// Lifecycle state of one direction of a connection lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Connection attempt underway. Initial state of every lease.
    #[default]
    Initiated,

    /// The TCP link is up and traffic may flow.
    Established,

    /// This direction is done for the lifetime of the lease. Terminal.
    Closed,
}

impl LinkState {
    /// Transition to `Established`.
    ///
    /// Valid from: `Initiated`.
    pub fn establish(&mut self) -> Result<(), ChatError> {
        match self {
            Self::Initiated => {
                *self = Self::Established;
                Ok(())
            }
            _ => Err(ChatError::InvalidTransition(
                "cannot establish: not in Initiated state",
            )),
        }
    }

    /// Transition to `Closed`.
    ///
    /// Valid from any state; returns `true` only when the state actually
    /// changed, so callers can emit the closing event exactly once.
    pub fn close(&mut self) -> bool {
        if *self == Self::Closed {
            return false;
        }
        *self = Self::Closed;
        true
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

// ── Tests ────────────────────────────────────────────────────────
