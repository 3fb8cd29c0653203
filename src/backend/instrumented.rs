//! Key-touch accounting around any backend.
//!
//! [`InstrumentedBackend`] forwards every call to the wrapped backend and
//! records how many calls were made and how many keys they carried. It is how
//! the crate compares the cost of different counter shapes: two counters that
//! answer every query identically can still touch very different numbers of
//! keys.
//!
//! The statistics live in the wrapper instance, never in process-wide state,
//! so independent measurements do not interfere.
//!
//! # Example
//!
//! ```rust
//! use sommatori::backend::{InstrumentedBackend, MemoryBackend};
//! use sommatori::context::Context;
//! use sommatori::counters::range_tree::RangeTreeCounter;
//! use sommatori::counters::RangeCounter;
//! use sommatori::tree::TreeShape;
//!
//! let backend = InstrumentedBackend::new(MemoryBackend::new()).with_name("tree-4-2");
//! let counter = RangeTreeCounter::new(&backend, TreeShape::new(4, 2).unwrap());
//! let ctx = Context::background();
//!
//! counter.increment(&ctx, 5, 1).unwrap();
//! counter.query_sum(&ctx, 5, 5).unwrap();
//!
//! let stats = backend.stats();
//! assert_eq!(stats.increment_keys, 4);
//! assert_eq!(stats.query_keys, 1);
//! ```

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::backend::Backend;
use crate::context::Context;
use crate::error::BackendError;

/// Point-in-time copy of an [`InstrumentedBackend`]'s counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackendStats {
    /// Name given with [`InstrumentedBackend::with_name`].
    pub name: String,
    /// Number of `query` calls.
    pub query_calls: u64,
    /// Total keys passed to `query`.
    pub query_keys: u64,
    /// Number of `increment` calls.
    pub increment_calls: u64,
    /// Total keys passed to `increment`.
    pub increment_keys: u64,
}

impl BackendStats {
    /// Average keys per query call, zero if there were none.
    pub fn keys_per_query(&self) -> f64 {
        ratio(self.query_keys, self.query_calls)
    }

    /// Average keys per increment call, zero if there were none.
    pub fn keys_per_increment(&self) -> f64 {
        ratio(self.increment_keys, self.increment_calls)
    }

    /// Keys touched by both operations together.
    pub fn total_keys(&self) -> u64 {
        self.query_keys + self.increment_keys
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// A [`Backend`] wrapper counting calls and keys.
///
/// Calls are counted when issued, whether or not the inner backend
/// succeeds.
pub struct InstrumentedBackend<B> {
    name: String,
    inner: B,
    query_calls: CachePadded<AtomicU64>,
    query_keys: CachePadded<AtomicU64>,
    increment_calls: CachePadded<AtomicU64>,
    increment_keys: CachePadded<AtomicU64>,
}

impl<B> InstrumentedBackend<B> {
    /// Wraps `inner` with all counters at zero.
    pub fn new(inner: B) -> Self {
        Self {
            name: String::new(),
            inner,
            query_calls: CachePadded::new(AtomicU64::new(0)),
            query_keys: CachePadded::new(AtomicU64::new(0)),
            increment_calls: CachePadded::new(AtomicU64::new(0)),
            increment_keys: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Sets the name reported in [`BackendStats`].
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Returns the name of this backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Consumes the wrapper and returns the wrapped backend.
    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Current counter values.
    pub fn stats(&self) -> BackendStats {
        BackendStats {
            name: self.name.clone(),
            query_calls: self.query_calls.load(Ordering::Relaxed),
            query_keys: self.query_keys.load(Ordering::Relaxed),
            increment_calls: self.increment_calls.load(Ordering::Relaxed),
            increment_keys: self.increment_keys.load(Ordering::Relaxed),
        }
    }

    /// Returns the current values and sets every counter back to zero.
    pub fn stats_and_reset(&self) -> BackendStats {
        BackendStats {
            name: self.name.clone(),
            query_calls: self.query_calls.swap(0, Ordering::Relaxed),
            query_keys: self.query_keys.swap(0, Ordering::Relaxed),
            increment_calls: self.increment_calls.swap(0, Ordering::Relaxed),
            increment_keys: self.increment_keys.swap(0, Ordering::Relaxed),
        }
    }

    /// Sets every counter back to zero.
    pub fn reset(&self) {
        self.stats_and_reset();
    }
}

impl<B: Backend> Backend for InstrumentedBackend<B> {
    fn query(&self, ctx: &Context, keys: &[String]) -> Result<Vec<i64>, BackendError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        self.query_keys
            .fetch_add(keys.len() as u64, Ordering::Relaxed);
        self.inner.query(ctx, keys)
    }

    fn increment(&self, ctx: &Context, keys: &[String], deltas: &[i64]) -> Result<(), BackendError> {
        self.increment_calls.fetch_add(1, Ordering::Relaxed);
        self.increment_keys
            .fetch_add(keys.len() as u64, Ordering::Relaxed);
        self.inner.increment(ctx, keys, deltas)
    }
}

impl<B: Debug> Debug for InstrumentedBackend<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedBackend")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .field("inner", &self.inner)
            .finish()
    }
}
