//! Liveness watchdog for an active session.
//!
//! The watchdog itself keeps no clock. Each session task races its own
//! operation against a deadline and reports the outcome as a typed event:
//! `Alive` when work completed, `Elapsed` when the deadline ran out first.
//! The watchdog serially drains those events and ends the session on the
//! first `Elapsed` it sees, whichever task it came from — a one-sided stall
//! is indistinguishable from a dead peer, so it is treated as one.

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{ChatError, LostCause};

// ── TaskKind ─────────────────────────────────────────────────────

/// Which session task produced a watchdog event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Read,
    Send,
    KeepAlive,
    Handshake,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Read => write!(f, "read"),
            TaskKind::Send => write!(f, "send"),
            TaskKind::KeepAlive => write!(f, "keep-alive"),
            TaskKind::Handshake => write!(f, "handshake"),
        }
    }
}

// ── WatchdogEvent ────────────────────────────────────────────────

/// A timestamped liveness record, consumed once, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// Some task made observable progress.
    Alive {
        /// Human-readable description of what proved the link alive.
        source: &'static str,
        at: DateTime<Local>,
    },
    /// A task's per-operation deadline ran out with no progress.
    Elapsed {
        task: TaskKind,
        timeout: Duration,
        at: DateTime<Local>,
    },
}

// ── WatchdogHandle ───────────────────────────────────────────────

/// Producer side of the activity channel, cloned into each session task.
///
/// Sends are fire-and-forget: if the watchdog is already gone the session
/// is tearing down and the signal no longer matters.
#[derive(Debug, Clone)]
pub struct WatchdogHandle {
    tx: mpsc::UnboundedSender<WatchdogEvent>,
}

impl WatchdogHandle {
    /// Create the activity channel, returning the producer handle and the
    /// consumer end for [`watch_connection`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WatchdogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report activity.
    pub fn alive(&self, source: &'static str) {
        let _ = self.tx.send(WatchdogEvent::Alive {
            source,
            at: Local::now(),
        });
    }

    /// Report an elapsed deadline.
    pub fn elapsed(&self, task: TaskKind, timeout: Duration) {
        let _ = self.tx.send(WatchdogEvent::Elapsed {
            task,
            timeout,
            at: Local::now(),
        });
    }
}

// ── watch_connection ─────────────────────────────────────────────

/// Drain the activity channel until a deadline elapses.
///
/// Returns `Err(ConnectivityLost)` on the first `Elapsed` event, carrying
/// the originating task and its timeout. Returns `Ok(())` if every
/// producer hangs up first — the session is ending for other reasons.
pub async fn watch_connection(
    rx: &mut mpsc::UnboundedReceiver<WatchdogEvent>,
) -> Result<(), ChatError> {
    while let Some(event) = rx.recv().await {
        match event {
            WatchdogEvent::Alive { source, at } => {
                debug!(target: "watchdog", source, at = %at.format("%H:%M:%S"), "connection is alive");
            }
            WatchdogEvent::Elapsed { task, timeout, at } => {
                warn!(target: "watchdog", %task, ?timeout, at = %at.format("%H:%M:%S"), "timeout elapsed");
                return Err(ChatError::ConnectivityLost(LostCause::Stalled {
                    task,
                    timeout,
                }));
            }
        }
    }
    Ok(())
}
