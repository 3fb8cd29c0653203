//! Fixed-duration time buckets.
//!
//! A [`Granularity`] turns a timestamp into an integer bucket index by flooring
//! the nanoseconds since the Unix epoch by its duration. The set is closed, so
//! every function here is total: there is no "unknown granularity" case.
//!
//! ```rust
//! use sommatori::granularity::Granularity;
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let t = UNIX_EPOCH + Duration::from_secs(3 * 3600 + 59);
//! assert_eq!(Granularity::Hour.bucket_index(t), 3);
//! assert_eq!(Granularity::Minute.bucket_index(t), 180);
//! assert_eq!(Granularity::Hour.align(t), UNIX_EPOCH + Duration::from_secs(3 * 3600));
//! ```

use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Duration a time-based counter's bucket represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Granularity {
    /// One second.
    Second,
    /// Sixty seconds.
    Minute,
    /// Sixty minutes.
    Hour,
}

impl Granularity {
    /// All granularities, finest first.
    pub const ALL: [Granularity; 3] = [Granularity::Second, Granularity::Minute, Granularity::Hour];

    /// Length of one bucket in whole seconds.
    pub const fn seconds(self) -> u64 {
        match self {
            Granularity::Second => 1,
            Granularity::Minute => 60,
            Granularity::Hour => 3_600,
        }
    }

    /// Length of one bucket.
    pub const fn duration(self) -> Duration {
        Duration::from_secs(self.seconds())
    }

    /// Length of one bucket in nanoseconds.
    pub const fn nanos(self) -> i128 {
        self.seconds() as i128 * 1_000_000_000
    }

    /// Display name, also used as the key prefix of
    /// [`LinearTimeCounter`](crate::counters::linear_time::LinearTimeCounter).
    pub const fn name(self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
        }
    }

    /// Index of the bucket containing `at`, floored so instants before the
    /// epoch land in negative buckets.
    pub fn bucket_index(self, at: SystemTime) -> i64 {
        let bucket = epoch_nanos(at).div_euclid(self.nanos());
        // |nanos| < 2^96 and the finest bucket is 1e9 ns, so this always fits.
        bucket as i64
    }

    /// Start of bucket `index`, or `None` past the limits of [`SystemTime`].
    pub fn bucket_start(self, index: i64) -> Option<SystemTime> {
        from_epoch_nanos(self.nanos().checked_mul(i128::from(index))?)
    }

    /// Rounds `at` down to the start of its bucket.
    pub fn align(self, at: SystemTime) -> SystemTime {
        let nanos = epoch_nanos(at);
        let aligned = nanos - nanos.rem_euclid(self.nanos());
        from_epoch_nanos(aligned).unwrap_or(at)
    }

    /// Moves `at` by `buckets` whole buckets (negative moves backwards).
    ///
    /// Returns `None` when the result is not representable.
    pub fn shift(self, at: SystemTime, buckets: i64) -> Option<SystemTime> {
        let delta = self.nanos().checked_mul(i128::from(buckets))?;
        from_epoch_nanos(epoch_nanos(at).checked_add(delta)?)
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown granularity name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown granularity {0:?}, expected second, minute or hour")]
pub struct ParseGranularityError(String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => Ok(Granularity::Second),
            "m" | "min" | "minute" | "minutes" => Ok(Granularity::Minute),
            "h" | "hour" | "hours" => Ok(Granularity::Hour),
            _ => Err(ParseGranularityError(s.to_string())),
        }
    }
}

/// Signed nanoseconds between the Unix epoch and `at`.
fn epoch_nanos(at: SystemTime) -> i128 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_nanos() as i128,
        Err(before) => -(before.duration().as_nanos() as i128),
    }
}

fn from_epoch_nanos(nanos: i128) -> Option<SystemTime> {
    let magnitude = nanos.unsigned_abs();
    let secs = u64::try_from(magnitude / 1_000_000_000).ok()?;
    let offset = Duration::new(secs, (magnitude % 1_000_000_000) as u32);
    if nanos >= 0 {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    }
}
