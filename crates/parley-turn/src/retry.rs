//! Listening-retry policy.
//!
//! In always-listening setups the recognizer must be restarted whenever it
//! drops out. Each tick the policy restarts an idle recognizer and counts the
//! attempt; the count resets the moment the recognizer reports active.

use parley_services::ListeningService;

/// Consecutive failed restarts after which listening is reported as failed.
pub const MAX_FAILED_LISTEN_ATTEMPTS: u32 = 3;

/// What the policy did on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The native recognizer manages itself; nothing was checked.
    Skipped,
    /// The recognizer is active.
    Healthy,
    /// A start is still in progress.
    Initializing,
    /// The recognizer was idle and a restart was requested.
    Restarted { attempts: u32 },
    /// A restart was requested and the ceiling has been reached.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct ListeningRetry {
    consecutive_failures: u32,
    ceiling: u32,
}

impl Default for ListeningRetry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListeningRetry {
    pub fn new() -> Self {
        Self {
            consecutive_failures: 0,
            ceiling: MAX_FAILED_LISTEN_ATTEMPTS,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Inspect the recognizer once and restart it if it is idle.
    ///
    /// The counter is not reset when the ceiling is hit, so every further
    /// failing tick reports `Exhausted` until the recognizer recovers.
    pub fn observe(&mut self, listening: &dyn ListeningService) -> RetryOutcome {
        if listening.is_active() {
            if self.consecutive_failures > 0 {
                tracing::info!(
                    attempts = self.consecutive_failures,
                    "Listening recovered"
                );
            }
            self.consecutive_failures = 0;
            return RetryOutcome::Healthy;
        }

        if listening.is_initializing() {
            return RetryOutcome::Initializing;
        }

        listening.start();
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let attempts = self.consecutive_failures;

        if attempts >= self.ceiling {
            tracing::warn!(attempts, "Listening could not be restarted");
            RetryOutcome::Exhausted { attempts }
        } else {
            tracing::debug!(attempts, "Listening restart requested");
            RetryOutcome::Restarted { attempts }
        }
    }
}
