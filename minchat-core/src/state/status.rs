//! Status events emitted by the session supervisor.
//!
//! These are closed tagged variants; how they read on screen is the status
//! sink's business, not the engine's.

use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::state::link::{Direction, LinkState};

// ── Identity ─────────────────────────────────────────────────────

/// Who the server thinks we are.
///
/// A nickname is only valid for the lease whose authentication produced
/// it; when that lease closes, identity reverts to the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Unknown,
    Nick(String),
}

// ── StatusEvent ──────────────────────────────────────────────────

/// One entry in the status stream consumed by the display adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A direction of the current lease changed lifecycle state.
    Link {
        direction: Direction,
        state: LinkState,
    },
    /// Authentication produced (or teardown revoked) a nickname.
    Identity(Identity),
    /// The server refused the stored token. Terminal for the session,
    /// distinct from any connectivity failure.
    TokenRejected,
}

// ── StatusBoard ──────────────────────────────────────────────────

/// Tracks both direction state machines and emits their transitions.
///
/// The board enforces the monotonic per-direction order and guarantees
/// that `Closed` goes out for both directions (exactly once each, plus an
/// identity reset) however the session ends. Emission is best-effort: a
/// vanished status sink must not take down an otherwise healthy session.
#[derive(Debug)]
pub struct StatusBoard {
    tx: mpsc::UnboundedSender<StatusEvent>,
    read: Option<LinkState>,
    send: Option<LinkState>,
}

impl StatusBoard {
    pub fn new(tx: mpsc::UnboundedSender<StatusEvent>) -> Self {
        Self {
            tx,
            read: None,
            send: None,
        }
    }

    fn slot(&mut self, direction: Direction) -> &mut Option<LinkState> {
        match direction {
            Direction::Read => &mut self.read,
            Direction::Send => &mut self.send,
        }
    }

    fn emit(&self, event: StatusEvent) {
        let _ = self.tx.send(event);
    }

    /// A connection attempt is underway for `direction`.
    pub fn initiated(&mut self, direction: Direction) -> Result<(), ChatError> {
        let slot = self.slot(direction);
        if slot.is_some() {
            return Err(ChatError::InvalidTransition(
                "direction already initiated for this lease",
            ));
        }
        *slot = Some(LinkState::Initiated);
        self.emit(StatusEvent::Link {
            direction,
            state: LinkState::Initiated,
        });
        Ok(())
    }

    /// The lease is up and `direction` may carry traffic.
    pub fn established(&mut self, direction: Direction) -> Result<(), ChatError> {
        let slot = self.slot(direction);
        match slot {
            Some(state) => state.establish()?,
            None => {
                return Err(ChatError::InvalidTransition(
                    "cannot establish: direction was never initiated",
                ));
            }
        }
        self.emit(StatusEvent::Link {
            direction,
            state: LinkState::Established,
        });
        Ok(())
    }

    /// Authentication produced a nickname.
    pub fn identity(&self, identity: Identity) {
        self.emit(StatusEvent::Identity(identity));
    }

    /// The server refused the token.
    pub fn token_rejected(&self) {
        self.emit(StatusEvent::TokenRejected);
    }

    /// Close whatever is still open, in both directions, and revoke the
    /// identity. Safe to call on every exit path; repeated calls are
    /// no-ops.
    pub fn close_all(&mut self) {
        let mut closed_any = false;
        for direction in [Direction::Send, Direction::Read] {
            let closed = match self.slot(direction) {
                Some(state) => state.close(),
                None => false,
            };
            if closed {
                self.emit(StatusEvent::Link {
                    direction,
                    state: LinkState::Closed,
                });
                closed_any = true;
            }
        }
        if closed_any {
            self.emit(StatusEvent::Identity(Identity::Unknown));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn full_session_sequence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut board = StatusBoard::new(tx);

        board.initiated(Direction::Send).unwrap();
        board.initiated(Direction::Read).unwrap();
        board.established(Direction::Send).unwrap();
        board.established(Direction::Read).unwrap();
        board.identity(Identity::Nick("steve".to_string()));
        board.close_all();

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                StatusEvent::Link {
                    direction: Direction::Send,
                    state: LinkState::Initiated
                },
                StatusEvent::Link {
                    direction: Direction::Read,
                    state: LinkState::Initiated
                },
                StatusEvent::Link {
                    direction: Direction::Send,
                    state: LinkState::Established
                },
                StatusEvent::Link {
                    direction: Direction::Read,
                    state: LinkState::Established
                },
                StatusEvent::Identity(Identity::Nick("steve".to_string())),
                StatusEvent::Link {
                    direction: Direction::Send,
                    state: LinkState::Closed
                },
                StatusEvent::Link {
                    direction: Direction::Read,
                    state: LinkState::Closed
                },
                StatusEvent::Identity(Identity::Unknown),
            ]
        );
    }

    #[test]
    fn close_all_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut board = StatusBoard::new(tx);

        board.initiated(Direction::Send).unwrap();
        board.close_all();
        board.close_all();

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                StatusEvent::Link {
                    direction: Direction::Send,
                    state: LinkState::Initiated
                },
                StatusEvent::Link {
                    direction: Direction::Send,
                    state: LinkState::Closed
                },
                StatusEvent::Identity(Identity::Unknown),
            ]
        );
    }

    #[test]
    fn close_all_before_anything_emits_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut board = StatusBoard::new(tx);
        board.close_all();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn establish_without_initiate_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut board = StatusBoard::new(tx);
        assert!(board.established(Direction::Read).is_err());
    }

    #[test]
    fn dropped_sink_does_not_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut board = StatusBoard::new(tx);
        board.initiated(Direction::Send).unwrap();
        board.close_all();
    }
}
