//! Index rescaling between granularities.
//!
//! [`RangeTranslator`] lets a counter holding fine-grained indices (say, one
//! per second) answer coarse ones (one per minute) without keeping a second
//! counter. Coarse index `i` maps to the fine span
//! `[i·factor, i·factor + factor − 1]`.
//!
//! ```text
//!   factor = 60
//!
//!   coarse:   |        0        |        1        |
//!   fine:     | 0 1 2 ...    59 | 60 61  ...  119 |
//!
//!   increment(1, by)   -> inner.increment(60, by)
//!   query_sum(0, 1)    -> inner.query_sum(0, 119)
//! ```

use std::fmt::{self, Debug};

use tracing::debug;

use crate::context::Context;
use crate::counters::RangeCounter;
use crate::error::{ConfigError, Error, Operation, Result};
use crate::granularity::Granularity;

/// A [`RangeCounter`] scaling indices by a positive integer factor before
/// delegating to an inner counter.
///
/// # Examples
///
/// ```rust
/// use sommatori::adapters::RangeTranslator;
/// use sommatori::backend::MemoryBackend;
/// use sommatori::counters::linear::LinearCounter;
/// use sommatori::error::ConfigError;
/// use sommatori::granularity::Granularity;
///
/// let inner = LinearCounter::new(MemoryBackend::new());
/// let t = RangeTranslator::new(inner, Granularity::Hour, Granularity::Second).unwrap();
/// assert_eq!(t.factor(), 3600);
///
/// let inner = LinearCounter::new(MemoryBackend::new());
/// assert!(matches!(
///     RangeTranslator::new(inner, Granularity::Second, Granularity::Hour),
///     Err(ConfigError::CoarserTarget { .. })
/// ));
/// ```
pub struct RangeTranslator<C> {
    inner: C,
    factor: i64,
}

impl<C> RangeTranslator<C> {
    /// Wraps `inner`, which stores indices of granularity `to`, to serve
    /// indices of granularity `from`. Fails when `to` is coarser than `from`.
    pub fn new(inner: C, from: Granularity, to: Granularity) -> std::result::Result<Self, ConfigError> {
        if to.seconds() > from.seconds() {
            return Err(ConfigError::CoarserTarget { from, to });
        }
        let translator = Self::with_factor(inner, (from.seconds() / to.seconds()) as i64)?;
        debug!(%from, %to, factor = translator.factor, "range translator created");
        Ok(translator)
    }

    /// Wraps `inner` with an explicit scale factor, which must be positive.
    pub fn with_factor(inner: C, factor: i64) -> std::result::Result<Self, ConfigError> {
        if factor < 1 {
            return Err(ConfigError::NonPositiveFactor { factor });
        }
        Ok(Self { inner, factor })
    }

    /// Number of inner indices per outer index.
    pub fn factor(&self) -> i64 {
        self.factor
    }

    /// Returns a reference to the inner counter.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Consumes the translator and returns the inner counter.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Replaces the inner counter, keeping the factor.
    pub fn map_inner<D>(self, f: impl FnOnce(C) -> D) -> RangeTranslator<D> {
        RangeTranslator {
            inner: f(self.inner),
            factor: self.factor,
        }
    }

    /// Inner index an increment at `at` lands on.
    pub fn scale_index(&self, at: i64) -> Result<i64> {
        at.checked_mul(self.factor).ok_or(Error::IndexOverflow {
            op: Operation::Increment,
            index: at,
        })
    }

    /// Inner range covering the outer range `[from, to]`.
    pub fn scale_range(&self, from: i64, to: i64) -> Result<(i64, i64)> {
        let overflow = |index| Error::IndexOverflow {
            op: Operation::Query,
            index,
        };
        let start = from.checked_mul(self.factor).ok_or_else(|| overflow(from))?;
        let end = to
            .checked_mul(self.factor)
            .and_then(|end| end.checked_add(self.factor - 1))
            .ok_or_else(|| overflow(to))?;
        Ok((start, end))
    }
}

impl<C: RangeCounter> RangeCounter for RangeTranslator<C> {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        self.inner.increment(ctx, self.scale_index(at)?, by)
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        if from > to {
            ctx.check()?;
            return Ok(0);
        }
        let (start, end) = self.scale_range(from, to)?;
        self.inner.query_sum(ctx, start, end)
    }
}

impl<C: Debug> Debug for RangeTranslator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeTranslator")
            .field("factor", &self.factor)
            .field("inner", &self.inner)
            .finish()
    }
}
