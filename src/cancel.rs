//! Caller-controlled cancellation and deadlines.
//!
//! A `CancelToken` is cheap to clone; clones share the same
//! `CancellationToken`, so a UI thread can keep one and cancel an
//! operation running on a worker. The optional deadline rides alongside.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::errors::{KeepsakeError, Result};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never fires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A token that fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A token cancelled along with this one, keeping its deadline.
    /// Cancelling the child leaves the parent untouched.
    pub fn child(&self) -> Self {
        Self {
            cancelled: self.cancelled.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// Completes once the token is cancelled, for async callers.
    pub async fn cancelled(&self) {
        self.cancelled.cancelled().await;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail with `Cancelled` or `Timeout` if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(KeepsakeError::Cancelled);
        }
        if matches!(self.remaining(), Some(left) if left.is_zero()) {
            return Err(KeepsakeError::Timeout);
        }
        Ok(())
    }

    /// The timeout to give a single remote call: the per-call limit, or
    /// whatever is left of this token's deadline if that is sooner.
    pub fn call_timeout(&self, per_call: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(per_call),
            None => per_call,
        }
    }
}
