//! Optional verification lockout after repeated failures.

use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::LockoutPolicy;
use crate::outcome::SessionOutcome;

/// Counts consecutive failed verifications.
///
/// A grant resets the count; outcomes that are neither a grant nor an
/// authentication failure leave it unchanged.
#[derive(Debug)]
pub struct LockoutTracker {
    policy: Option<LockoutPolicy>,
    consecutive_failures: u32,
    locked_until: Option<Instant>,
}

impl LockoutTracker {
    pub fn new(policy: Option<LockoutPolicy>) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
            locked_until: None,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether verification is currently suspended.
    pub fn is_locked(&mut self) -> bool {
        match self.locked_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                info!("Lockout expired");
                self.locked_until = None;
                false
            }
            None => false,
        }
    }

    /// Feed a finished session into the counter.
    pub fn record(&mut self, outcome: &SessionOutcome) {
        let Some(policy) = self.policy else {
            return;
        };

        if outcome.is_granted() {
            self.consecutive_failures = 0;
            return;
        }
        if !outcome.is_authentication_failure() {
            return;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= policy.max_failures {
            warn!(
                failures = self.consecutive_failures,
                duration_ms = policy.duration.as_millis() as u64,
                "Too many failed verifications, locking out"
            );
            self.locked_until = Some(Instant::now() + policy.duration);
            self.consecutive_failures = 0;
        }
    }
}
