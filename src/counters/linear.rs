//! One backend key per index.
//!
//! [`LinearCounter`] is the reference every other integer counter is checked
//! against: increments write a single key, queries read every index in the
//! range. It is exact and simple, and its queries grow with the range length.

use std::fmt::{self, Debug};

use tracing::debug;

use crate::backend::Backend;
use crate::context::Context;
use crate::counters::{read_sum, write_all, RangeCounter};
use crate::error::Result;

/// A [`RangeCounter`] storing each index under its own key, `"{namespace}@{index}"`.
///
/// # Examples
///
/// ```rust
/// use sommatori::backend::MemoryBackend;
/// use sommatori::context::Context;
/// use sommatori::counters::linear::LinearCounter;
/// use sommatori::counters::RangeCounter;
///
/// let backend = MemoryBackend::new();
/// let counter = LinearCounter::new(&backend).with_namespace("hits");
/// let ctx = Context::background();
///
/// counter.increment(&ctx, 4, 2).unwrap();
/// counter.increment(&ctx, 6, 1).unwrap();
///
/// assert_eq!(counter.query_sum(&ctx, 0, 5).unwrap(), 2);
/// assert_eq!(counter.query_sum(&ctx, 4, 6).unwrap(), 3);
/// assert_eq!(backend.get("hits@4"), 2);
/// ```
pub struct LinearCounter<B> {
    backend: B,
    namespace: String,
}

impl<B> LinearCounter<B> {
    /// Creates a counter writing to `backend` with an empty namespace.
    pub fn new(backend: B) -> Self {
        debug!("linear counter created");
        Self {
            backend,
            namespace: String::new(),
        }
    }

    /// Sets the key namespace, returning `self` for method chaining.
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..self
        }
    }

    /// Returns the key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns a reference to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Key holding index `at`.
    pub fn key(&self, at: i64) -> String {
        format!("{}@{}", self.namespace, at)
    }

    /// Keys a query of `[from, to]` reads, in index order.
    pub fn query_keys(&self, from: i64, to: i64) -> Vec<String> {
        if from > to {
            return Vec::new();
        }
        (from..=to).map(|at| self.key(at)).collect()
    }
}

impl<B: Backend> RangeCounter for LinearCounter<B> {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        write_all(&self.backend, ctx, &[self.key(at)], by)
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        read_sum(&self.backend, ctx, &self.query_keys(from, to))
    }
}

impl<B: Debug> Debug for LinearCounter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearCounter")
            .field("namespace", &self.namespace)
            .field("backend", &self.backend)
            .finish()
    }
}
