//! Reconnect driver: endless session supervision with capped backoff.
//!
//! The driver runs sessions strictly sequentially. Transient failures
//! (connect refused, connectivity lost, a garbled handshake reply) earn a
//! doubling sleep capped at the ceiling and another attempt, forever; a
//! long-lived client never gives up on its server. A rejected token is a
//! configuration problem, not a transient failure, so it propagates, as
//! does every other error class.

use std::time::Duration;

use tracing::warn;

use crate::error::ChatError;
use crate::session::ChatSession;

// ── RetryPolicy ──────────────────────────────────────────────────

/// Backoff schedule applied between failed sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Growth factor per consecutive failure.
    pub multiplier: u32,
    /// Upper bound on any single delay.
    pub ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            multiplier: 2,
            ceiling: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based): `base ·
    /// multiplierᵃ`, saturating, never above the ceiling.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.base.saturating_mul(factor).min(self.ceiling)
    }

    /// Whether `error` is worth another connection attempt.
    pub fn retries(&self, error: &ChatError) -> bool {
        error.is_transient()
    }
}

// ── Driver ───────────────────────────────────────────────────────

/// Run sessions until one ends cleanly or fails in a way the policy does
/// not retry.
///
/// The attempt counter grows across the whole run; the ceiling keeps the
/// cost bounded for clients that live for days.
pub async fn run_with_backoff(
    session: &mut ChatSession,
    policy: &RetryPolicy,
) -> Result<(), ChatError> {
    let mut attempt: u32 = 0;
    loop {
        match session.run_once().await {
            Ok(()) => return Ok(()),
            Err(error) if policy.retries(&error) => {
                let delay = policy.delay_for(attempt);
                attempt = attempt.saturating_add(1);
                warn!(%error, ?delay, attempt, "retrying session");
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
