//! Pacing for the lock acquisition loop.
//!
//! The remote store answers a held lock with 412 and never notifies waiters,
//! so acquisition is a poll. [`LockPolicy`] decides how long to wait between
//! polls. It never limits how many polls happen: a waiter gives up only
//! through its [`Context`](crate::core::context::Context).

use std::time::Duration;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockPolicy {
    /// Delay after the first 412. Zero polls back to back.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl LockPolicy {
    /// Retry immediately after every 412.
    pub fn immediate() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_backoff: interval,
            max_backoff: interval,
            multiplier: 1.0,
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: *self,
            current: self.initial_backoff.min(self.max_backoff),
        }
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

/// Delay sequence for one `lock` call.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: LockPolicy,
    current: Duration,
}

impl Backoff {
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let grown = self.current.mul_f64(self.policy.multiplier.max(1.0));
        self.current = grown.min(self.policy.max_backoff);
        delay
    }
}
