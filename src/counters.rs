//! Counter capability traits and the counters built directly on a backend.
//!
//! Two capability traits describe every counter in this crate:
//!
//! - [`RangeCounter`]: increment an integer index, sum a closed index range.
//! - [`TimeRangeCounter`]: increment a timestamp's bucket, sum the
//!   `bucket_count` buckets ending at a timestamp's bucket.
//!
//! The concrete kinds form a closed set, gathered in the [`IntCounter`] and
//! [`TimeCounter`] enums so a counter of any kind can be chosen at runtime
//! without trait objects:
//!
//! | Kind | Trait | Keys per increment | Keys per query |
//! |------|-------|--------------------|----------------|
//! | [`LinearCounter`](linear::LinearCounter) | [`RangeCounter`] | 1 | range length |
//! | [`RangeTreeCounter`](range_tree::RangeTreeCounter) | [`RangeCounter`] | `H` | `O(H · 2^B)` |
//! | [`RangeTranslator`] | [`RangeCounter`] | inner | inner |
//! | [`LinearTimeCounter`](linear_time::LinearTimeCounter) | [`TimeRangeCounter`] | 1 | bucket count |
//! | [`BucketedTimeCounter`] | [`TimeRangeCounter`] | inner | inner |
//!
//! Every kind answers every query identically; they differ only in how many
//! backend keys they touch.
//!
//! # Example
//!
//! ```rust
//! use sommatori::backend::MemoryBackend;
//! use sommatori::context::Context;
//! use sommatori::counters::{IntCounter, RangeCounter};
//! use sommatori::tree::TreeShape;
//!
//! let backend = MemoryBackend::new();
//! let ctx = Context::background();
//!
//! let linear = IntCounter::linear(&backend).with_namespace("oracle");
//! let tree = IntCounter::tree(&backend, TreeShape::new(4, 2).unwrap()).with_namespace("tree");
//!
//! for counter in [&linear, &tree] {
//!     counter.increment(&ctx, 3, 2).unwrap();
//!     counter.increment(&ctx, 9, 5).unwrap();
//! }
//! assert_eq!(linear.query_sum(&ctx, 0, 10).unwrap(), 7);
//! assert_eq!(tree.query_sum(&ctx, 0, 10).unwrap(), 7);
//! ```

pub mod linear;
pub mod linear_time;
pub mod range_tree;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{trace, warn};

use crate::adapters::{BucketedTimeCounter, RangeTranslator};
use crate::backend::Backend;
use crate::context::Context;
use crate::error::{ConfigError, Error, Operation, Result};
use crate::granularity::Granularity;
use crate::tree::TreeShape;

use linear::LinearCounter;
use linear_time::LinearTimeCounter;
use range_tree::RangeTreeCounter;

/// A counter over integer indices.
///
/// Implementations must agree on every result: only the backend keys they
/// touch may differ.
pub trait RangeCounter: Debug {
    /// Adds `by` at index `at`.
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()>;

    /// Sum of every increment at an index in `[from, to]`. An empty range
    /// (`from > to`) sums to zero.
    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64>;
}

/// A counter over timestamps, bucketed by a fixed [`Granularity`].
pub trait TimeRangeCounter: Debug {
    /// Adds `by` to the bucket containing `at`.
    fn increment(&self, ctx: &Context, at: SystemTime, by: i64) -> Result<()>;

    /// Sum over the `bucket_count` buckets ending with (and including) the
    /// bucket containing `at`. Zero buckets sum to zero.
    fn query_sum(&self, ctx: &Context, at: SystemTime, bucket_count: u32) -> Result<i64>;

    /// Bucket size of this counter.
    fn granularity(&self) -> Granularity;
}

impl<C: RangeCounter + ?Sized> RangeCounter for &C {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        (**self).increment(ctx, at, by)
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        (**self).query_sum(ctx, from, to)
    }
}

impl<C: RangeCounter + ?Sized> RangeCounter for Arc<C> {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        (**self).increment(ctx, at, by)
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        (**self).query_sum(ctx, from, to)
    }
}

impl<C: RangeCounter + ?Sized> RangeCounter for Box<C> {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        (**self).increment(ctx, at, by)
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        (**self).query_sum(ctx, from, to)
    }
}

impl<C: TimeRangeCounter + ?Sized> TimeRangeCounter for &C {
    fn increment(&self, ctx: &Context, at: SystemTime, by: i64) -> Result<()> {
        (**self).increment(ctx, at, by)
    }

    fn query_sum(&self, ctx: &Context, at: SystemTime, bucket_count: u32) -> Result<i64> {
        (**self).query_sum(ctx, at, bucket_count)
    }

    fn granularity(&self) -> Granularity {
        (**self).granularity()
    }
}

/// Reads `keys` and sums them, failing on a cancelled context, a backend
/// error, a short response or an overflowing sum.
pub(crate) fn read_sum<B: Backend>(backend: &B, ctx: &Context, keys: &[String]) -> Result<i64> {
    ctx.check()?;
    if keys.is_empty() {
        return Ok(0);
    }

    let values = backend.query(ctx, keys).map_err(|source| {
        warn!(keys = keys.len(), error = %source, "backend query failed");
        Error::backend(Operation::Query, keys, source)
    })?;
    if values.len() != keys.len() {
        return Err(Error::backend(
            Operation::Query,
            keys,
            crate::error::BackendError::ResponseMismatch {
                expected: keys.len(),
                actual: values.len(),
            },
        ));
    }

    trace!(keys = keys.len(), "range sum read");
    values
        .into_iter()
        .try_fold(0i64, |sum, v| sum.checked_add(v))
        .ok_or(Error::SumOverflow)
}

/// Adds `by` to every key in one backend call.
pub(crate) fn write_all<B: Backend>(backend: &B, ctx: &Context, keys: &[String], by: i64) -> Result<()> {
    ctx.check()?;
    let deltas = vec![by; keys.len()];
    backend.increment(ctx, keys, &deltas).map_err(|source| {
        warn!(keys = keys.len(), error = %source, "backend increment failed");
        Error::backend(Operation::Increment, keys, source)
    })?;
    trace!(keys = keys.len(), by, "increment written");
    Ok(())
}

/// The closed set of integer counter kinds.
///
/// # Examples
///
/// ```rust
/// use sommatori::backend::MemoryBackend;
/// use sommatori::context::Context;
/// use sommatori::counters::{IntCounter, RangeCounter};
/// use sommatori::granularity::Granularity;
/// use sommatori::tree::TreeShape;
///
/// let backend = MemoryBackend::new();
/// let ctx = Context::background();
///
/// // minute indices stored in a per-second tree
/// let per_second = IntCounter::tree(&backend, TreeShape::new(12, 2).unwrap());
/// let per_minute = IntCounter::translated(per_second, Granularity::Minute, Granularity::Second).unwrap();
///
/// per_minute.increment(&ctx, 2, 1).unwrap();
/// assert_eq!(per_minute.query_sum(&ctx, 2, 2).unwrap(), 1);
/// ```
#[derive(Debug)]
pub enum IntCounter<B> {
    /// One key per index.
    Linear(LinearCounter<B>),
    /// Implicit range tree.
    Tree(RangeTreeCounter<B>),
    /// Another integer counter with a rescaled index space.
    Translated(Box<RangeTranslator<IntCounter<B>>>),
}

impl<B: Backend> IntCounter<B> {
    /// A linear counter on `backend`.
    pub fn linear(backend: B) -> Self {
        IntCounter::Linear(LinearCounter::new(backend))
    }

    /// A range-tree counter on `backend`.
    pub fn tree(backend: B, shape: TreeShape) -> Self {
        IntCounter::Tree(RangeTreeCounter::new(backend, shape))
    }

    /// Wraps `inner` so indices of granularity `from` are stored as indices
    /// of the finer granularity `to`.
    pub fn translated(
        inner: IntCounter<B>,
        from: Granularity,
        to: Granularity,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(IntCounter::Translated(Box::new(RangeTranslator::new(inner, from, to)?)))
    }

    /// Sets the key namespace of the counter at the bottom of the stack.
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        match self {
            IntCounter::Linear(c) => IntCounter::Linear(c.with_namespace(namespace)),
            IntCounter::Tree(c) => IntCounter::Tree(c.with_namespace(namespace)),
            IntCounter::Translated(t) => IntCounter::Translated(Box::new(
                t.map_inner(|inner| inner.with_namespace(namespace)),
            )),
        }
    }
}

impl<B: Backend> RangeCounter for IntCounter<B> {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        match self {
            IntCounter::Linear(c) => c.increment(ctx, at, by),
            IntCounter::Tree(c) => c.increment(ctx, at, by),
            IntCounter::Translated(c) => c.increment(ctx, at, by),
        }
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        match self {
            IntCounter::Linear(c) => c.query_sum(ctx, from, to),
            IntCounter::Tree(c) => c.query_sum(ctx, from, to),
            IntCounter::Translated(c) => c.query_sum(ctx, from, to),
        }
    }
}

impl<B> From<LinearCounter<B>> for IntCounter<B> {
    fn from(counter: LinearCounter<B>) -> Self {
        IntCounter::Linear(counter)
    }
}

impl<B> From<RangeTreeCounter<B>> for IntCounter<B> {
    fn from(counter: RangeTreeCounter<B>) -> Self {
        IntCounter::Tree(counter)
    }
}

/// The closed set of time counter kinds.
///
/// # Examples
///
/// ```rust
/// use sommatori::backend::MemoryBackend;
/// use sommatori::context::Context;
/// use sommatori::counters::{TimeCounter, TimeRangeCounter};
/// use sommatori::granularity::Granularity;
/// use sommatori::tree::TreeShape;
/// use std::time::SystemTime;
///
/// let backend = MemoryBackend::new();
/// let ctx = Context::background();
/// let counter = TimeCounter::tree(&backend, Granularity::Minute, TreeShape::default());
///
/// let now = SystemTime::now();
/// counter.increment(&ctx, now, 3).unwrap();
/// assert_eq!(counter.query_sum(&ctx, now, 5).unwrap(), 3);
/// ```
#[derive(Debug)]
pub enum TimeCounter<B> {
    /// One key per aligned timestamp.
    Linear(LinearTimeCounter<B>),
    /// Bucket indices stored in an integer counter.
    Bucketed(BucketedTimeCounter<IntCounter<B>>),
}

impl<B: Backend> TimeCounter<B> {
    /// A linear time counter on `backend`.
    pub fn linear(backend: B, granularity: Granularity) -> Self {
        TimeCounter::Linear(LinearTimeCounter::new(backend, granularity))
    }

    /// Bucket indices of `granularity` stored in a range tree of `shape`.
    pub fn tree(backend: B, granularity: Granularity, shape: TreeShape) -> Self {
        TimeCounter::Bucketed(BucketedTimeCounter::new(
            IntCounter::tree(backend, shape),
            granularity,
        ))
    }

    /// Bucket indices of `granularity` stored in `inner`.
    pub fn bucketed(inner: IntCounter<B>, granularity: Granularity) -> Self {
        TimeCounter::Bucketed(BucketedTimeCounter::new(inner, granularity))
    }
}

impl<B: Backend> TimeRangeCounter for TimeCounter<B> {
    fn increment(&self, ctx: &Context, at: SystemTime, by: i64) -> Result<()> {
        match self {
            TimeCounter::Linear(c) => c.increment(ctx, at, by),
            TimeCounter::Bucketed(c) => c.increment(ctx, at, by),
        }
    }

    fn query_sum(&self, ctx: &Context, at: SystemTime, bucket_count: u32) -> Result<i64> {
        match self {
            TimeCounter::Linear(c) => c.query_sum(ctx, at, bucket_count),
            TimeCounter::Bucketed(c) => c.query_sum(ctx, at, bucket_count),
        }
    }

    fn granularity(&self) -> Granularity {
        match self {
            TimeCounter::Linear(c) => c.granularity(),
            TimeCounter::Bucketed(c) => c.granularity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InstrumentedBackend, MemoryBackend};
    use crate::error::BackendError;

    /// A backend answering with one value too few.
    #[derive(Debug)]
    struct ShortBackend;

    impl Backend for ShortBackend {
        fn query(&self, _ctx: &Context, keys: &[String]) -> std::result::Result<Vec<i64>, BackendError> {
            Ok(vec![1; keys.len().saturating_sub(1)])
        }

        fn increment(&self, _ctx: &Context, _keys: &[String], _deltas: &[i64]) -> std::result::Result<(), BackendError> {
            Ok(())
        }
    }

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{i}")).collect()
    }

    #[test]
    fn test_read_sum_empty_skips_backend() {
        let backend = InstrumentedBackend::new(MemoryBackend::new());
        let sum = read_sum(&backend, &Context::background(), &[]).unwrap();
        assert_eq!(sum, 0);
        assert_eq!(backend.stats().query_calls, 0);
    }

    #[test]
    fn test_read_sum_short_response() {
        let err = read_sum(&ShortBackend, &Context::background(), &keys(3)).unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                op: Operation::Query,
                source: BackendError::ResponseMismatch { expected: 3, actual: 2 },
                ..
            }
        ));
    }

    #[test]
    fn test_read_sum_overflow() {
        let backend = MemoryBackend::new();
        let ctx = Context::background();
        write_all(&backend, &ctx, &keys(2), i64::MAX).unwrap();
        assert!(matches!(read_sum(&backend, &ctx, &keys(2)), Err(Error::SumOverflow)));
    }

    #[test]
    fn test_write_all_same_delta() {
        let backend = MemoryBackend::new();
        let ctx = Context::background();
        write_all(&backend, &ctx, &keys(3), 7).unwrap();
        assert_eq!(read_sum(&backend, &ctx, &keys(3)).unwrap(), 21);
    }

    #[test]
    fn test_cancelled_before_backend() {
        let backend = InstrumentedBackend::new(MemoryBackend::new());
        let ctx = Context::background();
        ctx.cancel_handle().cancel();
        assert!(matches!(write_all(&backend, &ctx, &keys(1), 1), Err(Error::Cancelled)));
        assert!(matches!(read_sum(&backend, &ctx, &keys(1)), Err(Error::Cancelled)));
        assert_eq!(backend.stats().total_keys(), 0);
    }

    #[test]
    fn test_int_counter_kinds_agree() {
        let backend = MemoryBackend::new();
        let ctx = Context::background();
        let counters = [
            IntCounter::linear(&backend).with_namespace("a"),
            IntCounter::tree(&backend, TreeShape::new(3, 2).unwrap()).with_namespace("b"),
            IntCounter::tree(&backend, TreeShape::new(1, 1).unwrap()).with_namespace("c"),
        ];
        for counter in &counters {
            for (at, by) in [(0, 1), (5, 2), (63, 3), (64, 4), (-2, 5)] {
                counter.increment(&ctx, at, by).unwrap();
            }
        }
        for counter in &counters {
            assert_eq!(counter.query_sum(&ctx, -10, 100).unwrap(), 15);
            assert_eq!(counter.query_sum(&ctx, 5, 63).unwrap(), 5);
            assert_eq!(counter.query_sum(&ctx, 64, 0).unwrap(), 0);
        }
    }

    #[test]
    fn test_translated_namespace_reaches_inner() {
        let backend = MemoryBackend::new();
        let ctx = Context::background();
        let counter = IntCounter::translated(
            IntCounter::linear(&backend),
            Granularity::Minute,
            Granularity::Second,
        )
        .unwrap()
        .with_namespace("ns");
        counter.increment(&ctx, 1, 1).unwrap();
        assert_eq!(backend.get("ns@60"), 1);
    }

    #[test]
    fn test_time_counter_kinds_agree() {
        use std::time::{Duration, UNIX_EPOCH};

        let backend = MemoryBackend::new();
        let ctx = Context::background();
        let base = UNIX_EPOCH + Duration::from_secs(1_546_300_800);
        let counters = [
            TimeCounter::linear(&backend, Granularity::Minute),
            TimeCounter::tree(&backend, Granularity::Minute, TreeShape::new(4, 3).unwrap()),
        ];
        for counter in &counters {
            assert_eq!(counter.granularity(), Granularity::Minute);
            counter.increment(&ctx, base, 1).unwrap();
            counter.increment(&ctx, base + Duration::from_secs(61), 2).unwrap();
        }
        for counter in &counters {
            assert_eq!(counter.query_sum(&ctx, base + Duration::from_secs(90), 2).unwrap(), 3);
            assert_eq!(counter.query_sum(&ctx, base + Duration::from_secs(90), 1).unwrap(), 2);
            assert_eq!(counter.query_sum(&ctx, base, 0).unwrap(), 0);
        }
    }
}
