//! Timestamps as integer bucket indices.

use std::fmt::{self, Debug};
use std::time::SystemTime;

use tracing::debug;

use crate::context::Context;
use crate::counters::{RangeCounter, TimeRangeCounter};
use crate::error::{Error, Operation, Result};
use crate::granularity::Granularity;

/// A [`TimeRangeCounter`] that maps each timestamp to its bucket index,
/// `floor(unix_time / granularity)`, and stores it in an integer counter.
///
/// The last `n` buckets ending at `at` become the closed index range
/// `[index(at) − (n − 1), index(at)]`, so a range-tree inner counter answers
/// long windows with few backend reads.
///
/// # Examples
///
/// ```rust
/// use sommatori::adapters::BucketedTimeCounter;
/// use sommatori::backend::MemoryBackend;
/// use sommatori::context::Context;
/// use sommatori::counters::linear::LinearCounter;
/// use sommatori::counters::TimeRangeCounter;
/// use sommatori::granularity::Granularity;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let backend = MemoryBackend::new();
/// let counter = BucketedTimeCounter::new(LinearCounter::new(&backend), Granularity::Minute);
/// let ctx = Context::background();
///
/// counter.increment(&ctx, UNIX_EPOCH + Duration::from_secs(150), 1).unwrap();
/// assert_eq!(backend.get("@2"), 1);
/// ```
pub struct BucketedTimeCounter<C> {
    inner: C,
    granularity: Granularity,
}

impl<C> BucketedTimeCounter<C> {
    /// Stores buckets of `granularity` as indices of `inner`.
    pub fn new(inner: C, granularity: Granularity) -> Self {
        debug!(%granularity, "bucketed time counter created");
        Self { inner, granularity }
    }

    /// Returns a reference to the inner counter.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Consumes the counter and returns the inner one.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Index range `[first, last]` of the `bucket_count` buckets ending at
    /// `at`'s bucket, or `None` when `bucket_count` is zero.
    pub fn bucket_range(&self, at: SystemTime, bucket_count: u32) -> Result<Option<(i64, i64)>> {
        if bucket_count == 0 {
            return Ok(None);
        }
        let last = self.granularity.bucket_index(at);
        let first = last
            .checked_sub(i64::from(bucket_count) - 1)
            .ok_or(Error::IndexOverflow {
                op: Operation::Query,
                index: last,
            })?;
        Ok(Some((first, last)))
    }
}

impl<C: RangeCounter> TimeRangeCounter for BucketedTimeCounter<C> {
    fn increment(&self, ctx: &Context, at: SystemTime, by: i64) -> Result<()> {
        self.inner
            .increment(ctx, self.granularity.bucket_index(at), by)
    }

    fn query_sum(&self, ctx: &Context, at: SystemTime, bucket_count: u32) -> Result<i64> {
        match self.bucket_range(at, bucket_count)? {
            Some((first, last)) => self.inner.query_sum(ctx, first, last),
            None => {
                ctx.check()?;
                Ok(0)
            }
        }
    }

    fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl<C: Debug> Debug for BucketedTimeCounter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketedTimeCounter")
            .field("granularity", &self.granularity)
            .field("inner", &self.inner)
            .finish()
    }
}
