//! Cancellation and deadlines for counter operations.
//!
//! Every counter operation takes a [`Context`]. The counters check it right
//! before talking to the backend and turn a cancelled context or an elapsed
//! deadline into an error. Backends receive the same context and may check it
//! again while they work.
//!
//! ```rust
//! use sommatori::context::Context;
//! use std::time::Duration;
//!
//! let ctx = Context::with_timeout(Duration::from_secs(1));
//! assert!(ctx.check().is_ok());
//!
//! let handle = ctx.cancel_handle();
//! handle.cancel();
//! assert!(ctx.check().is_err());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{BackendError, Error};

/// Caller supplied cancellation flag and optional deadline.
///
/// Clones share the cancellation flag, so cancelling through any clone or
/// [`CancelHandle`] is seen by all of them.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

/// Cancels the [`Context`] it was taken from.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancels the context. Operations already past their check complete.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    /// Derives a context sharing this one's cancellation flag, expiring at
    /// the earlier of the two deadlines.
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// Returns a handle that cancels this context and all its clones.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`Error::Cancelled`] or [`Error::DeadlineExceeded`] when the
    /// operation must not proceed. Cancellation wins over expiry.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else if self.is_expired() {
            Err(Error::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Same as [`check`](Self::check), in the backend's error vocabulary.
    pub fn check_backend(&self) -> Result<(), BackendError> {
        if self.is_cancelled() {
            Err(BackendError::Cancelled)
        } else if self.is_expired() {
            Err(BackendError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}
