//! One backend key per aligned timestamp.
//!
//! [`LinearTimeCounter`] is the time-keyed reference counter. Each bucket is
//! stored under `"{granularity}:{unix seconds of the bucket start}"`, e.g.
//! `hour:1546304400`, optionally prefixed by a namespace.

use std::fmt::{self, Debug};
use std::time::SystemTime;

use tracing::debug;

use crate::backend::Backend;
use crate::context::Context;
use crate::counters::{read_sum, write_all, TimeRangeCounter};
use crate::error::{Error, Operation, Result};
use crate::granularity::Granularity;

/// A [`TimeRangeCounter`] storing each bucket under its own key.
///
/// # Examples
///
/// ```rust
/// use sommatori::backend::MemoryBackend;
/// use sommatori::context::Context;
/// use sommatori::counters::linear_time::LinearTimeCounter;
/// use sommatori::counters::TimeRangeCounter;
/// use sommatori::granularity::Granularity;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let backend = MemoryBackend::new();
/// let counter = LinearTimeCounter::new(&backend, Granularity::Hour);
/// let ctx = Context::background();
///
/// let at = UNIX_EPOCH + Duration::from_secs(1_546_304_400 + 125);
/// counter.increment(&ctx, at, 1).unwrap();
///
/// assert_eq!(backend.get("hour:1546304400"), 1);
/// assert_eq!(counter.query_sum(&ctx, at, 1).unwrap(), 1);
/// ```
pub struct LinearTimeCounter<B> {
    backend: B,
    granularity: Granularity,
    namespace: String,
}

impl<B> LinearTimeCounter<B> {
    /// Creates a counter of `granularity` buckets writing to `backend`.
    pub fn new(backend: B, granularity: Granularity) -> Self {
        debug!(%granularity, "linear time counter created");
        Self {
            backend,
            granularity,
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

    /// Key of bucket `index`.
    pub fn bucket_key(&self, index: i64) -> String {
        let start = i128::from(index) * i128::from(self.granularity.seconds());
        if self.namespace.is_empty() {
            format!("{}:{}", self.granularity, start)
        } else {
            format!("{}:{}:{}", self.namespace, self.granularity, start)
        }
    }

    /// Key of the bucket containing `at`.
    pub fn key(&self, at: SystemTime) -> String {
        self.bucket_key(self.granularity.bucket_index(at))
    }

    /// Keys a query reads, newest bucket first.
    pub fn query_keys(&self, at: SystemTime, bucket_count: u32) -> Result<Vec<String>> {
        let end = self.granularity.bucket_index(at);
        (0..i64::from(bucket_count))
            .map(|back| {
                end.checked_sub(back)
                    .map(|index| self.bucket_key(index))
                    .ok_or(Error::IndexOverflow {
                        op: Operation::Query,
                        index: end,
                    })
            })
            .collect()
    }
}

impl<B: Backend> TimeRangeCounter for LinearTimeCounter<B> {
    fn increment(&self, ctx: &Context, at: SystemTime, by: i64) -> Result<()> {
        write_all(&self.backend, ctx, &[self.key(at)], by)
    }

    fn query_sum(&self, ctx: &Context, at: SystemTime, bucket_count: u32) -> Result<i64> {
        read_sum(&self.backend, ctx, &self.query_keys(at, bucket_count)?)
    }

    fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl<B: Debug> Debug for LinearTimeCounter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearTimeCounter")
            .field("granularity", &self.granularity)
            .field("namespace", &self.namespace)
            .field("backend", &self.backend)
            .finish()
    }
}
