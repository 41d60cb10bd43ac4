//! Caller-supplied cancellation for storage operations.
//!
//! A [`Context`] carries an optional deadline and an optional explicit cancel
//! signal. Every storage operation takes one and races its HTTP round trip
//! against it: when the context fires first the request future is dropped,
//! which aborts the in-flight call, and the operation returns
//! [`StorageError::Cancelled`].
//!
//! ```ignore
//! let ctx = Context::with_timeout(Duration::from_secs(30));
//! storage.lock(&ctx, "certs/example.com.lock").await?;
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::utils::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// [`CancelHandle::cancel`] was called.
    Cancelled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Fires the cancel signal of every context cloned from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that never fires.
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                deadline: None,
                cancel: Some(receiver),
            },
            CancelHandle { sender },
        )
    }

    /// Derives a context that keeps this one's cancel signal and fires at the
    /// earlier of the two deadlines.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context has fired, if it has.
    pub fn reason(&self) -> Option<CancelReason> {
        if let Some(receiver) = &self.cancel {
            if *receiver.borrow() {
                return Some(CancelReason::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<()> {
        match self.reason() {
            Some(reason) => Err(StorageError::Cancelled { reason }),
            None => Ok(()),
        }
    }

    /// Resolves once the context fires. Pending forever for a background context.
    pub async fn done(&self) -> CancelReason {
        let cancelled = async {
            if let Some(receiver) = &self.cancel {
                let mut receiver = receiver.clone();
                let fired = receiver.wait_for(|cancelled| *cancelled).await.is_ok();
                if fired {
                    return;
                }
            }
            // Handle dropped without cancelling: this signal can never fire.
            std::future::pending::<()>().await
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancelled => CancelReason::Cancelled,
            _ = expired => CancelReason::DeadlineExceeded,
        }
    }

    /// Drives `operation` to completion unless the context fires first.
    ///
    /// A result that is ready in the same wake-up as the context wins, so a
    /// granted lock is never discarded.
    pub async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            result = operation => result,
            reason = self.done() => Err(StorageError::Cancelled { reason }),
        }
    }

    /// Cancellable sleep.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            // still yield so a tight retry loop can't starve the runtime
            tokio::task::yield_now().await;
            return self.check();
        }
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
