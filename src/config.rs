//! Declarative counter configuration.
//!
//! [`CounterKind`] and [`TimeCounterKind`] describe a counter stack as plain
//! data, so the choice between a linear store, a tree shape or a translated
//! index space can come from a file or the command line. `build` validates
//! the description and returns the matching [`IntCounter`] or [`TimeCounter`].
//!
//! With the `serde` feature both types derive `Serialize`/`Deserialize`,
//! tagged by a `kind` field:
//!
//! ```json
//! {
//!   "kind": "bucketed",
//!   "granularity": "hour",
//!   "inner": {
//!     "kind": "translated",
//!     "from": "hour",
//!     "to": "second",
//!     "inner": { "kind": "tree", "height": 16, "bit_width": 2 }
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```rust
//! use sommatori::backend::MemoryBackend;
//! use sommatori::config::CounterKind;
//! use sommatori::context::Context;
//! use sommatori::counters::RangeCounter;
//!
//! let backend = MemoryBackend::new();
//! let counter = CounterKind::Tree { height: 4, bit_width: 2 }
//!     .build(&backend, "clicks")
//!     .unwrap();
//!
//! counter.increment(&Context::background(), 9, 1).unwrap();
//! assert_eq!(backend.get("clicks:0:0:2:1"), 1);
//! ```

use std::fmt::{self, Display};

use crate::backend::Backend;
use crate::counters::{IntCounter, TimeCounter};
use crate::error::ConfigError;
use crate::granularity::Granularity;
use crate::tree::TreeShape;

/// Description of an integer counter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum CounterKind {
    /// [`LinearCounter`](crate::counters::linear::LinearCounter).
    Linear,
    /// [`RangeTreeCounter`](crate::counters::range_tree::RangeTreeCounter) of the given shape.
    Tree {
        /// Number of tree levels.
        height: u32,
        /// Bits per non-root level.
        bit_width: u32,
    },
    /// [`RangeTranslator`](crate::adapters::RangeTranslator) from `from` indices
    /// to the `to` indices `inner` stores.
    Translated {
        /// Granularity of the indices the caller uses.
        from: Granularity,
        /// Granularity of the indices `inner` stores.
        to: Granularity,
        /// The wrapped counter.
        inner: Box<CounterKind>,
    },
}

impl CounterKind {
    /// A tree description with the default shape.
    pub fn default_tree() -> Self {
        let shape = TreeShape::default();
        CounterKind::Tree {
            height: shape.height(),
            bit_width: shape.bit_width(),
        }
    }

    /// Validates the description and builds the counter on `backend`, with
    /// every key prefixed by `namespace`.
    pub fn build<B: Backend>(&self, backend: B, namespace: &str) -> Result<IntCounter<B>, ConfigError> {
        let counter = match self {
            CounterKind::Linear => IntCounter::linear(backend),
            CounterKind::Tree { height, bit_width } => {
                IntCounter::tree(backend, TreeShape::new(*height, *bit_width)?)
            }
            CounterKind::Translated { from, to, inner } => {
                IntCounter::translated(inner.build(backend, "")?, *from, *to)?
            }
        };
        Ok(counter.with_namespace(namespace))
    }

    /// Parses a JSON description.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for CounterKind {
    fn default() -> Self {
        Self::default_tree()
    }
}

impl Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterKind::Linear => f.write_str("linear"),
            CounterKind::Tree { height, bit_width } => write!(f, "tree({height},{bit_width})"),
            CounterKind::Translated { from, to, inner } => write!(f, "{from}->{to} {inner}"),
        }
    }
}

/// Description of a time counter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum TimeCounterKind {
    /// [`LinearTimeCounter`](crate::counters::linear_time::LinearTimeCounter).
    Linear {
        /// Bucket size.
        granularity: Granularity,
    },
    /// [`BucketedTimeCounter`](crate::adapters::BucketedTimeCounter) over an
    /// integer counter.
    Bucketed {
        /// Bucket size.
        granularity: Granularity,
        /// The integer counter storing bucket indices.
        inner: CounterKind,
    },
}

impl TimeCounterKind {
    /// Bucket size of the described counter.
    pub fn granularity(&self) -> Granularity {
        match self {
            TimeCounterKind::Linear { granularity } | TimeCounterKind::Bucketed { granularity, .. } => {
                *granularity
            }
        }
    }

    /// Validates the description and builds the counter on `backend`, with
    /// every key prefixed by `namespace`.
    pub fn build<B: Backend>(&self, backend: B, namespace: &str) -> Result<TimeCounter<B>, ConfigError> {
        Ok(match self {
            TimeCounterKind::Linear { granularity } => TimeCounter::Linear(
                crate::counters::linear_time::LinearTimeCounter::new(backend, *granularity)
                    .with_namespace(namespace),
            ),
            TimeCounterKind::Bucketed { granularity, inner } => {
                TimeCounter::bucketed(inner.build(backend, namespace)?, *granularity)
            }
        })
    }

    /// Parses a JSON description.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Display for TimeCounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeCounterKind::Linear { granularity } => write!(f, "{granularity} linear"),
            TimeCounterKind::Bucketed { granularity, inner } => write!(f, "{granularity} {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::context::Context;
    use crate::counters::{RangeCounter, TimeRangeCounter};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_build_each_kind() {
        let backend = MemoryBackend::new();
        let ctx = Context::background();
        let kinds = [
            CounterKind::Linear,
            CounterKind::Tree { height: 4, bit_width: 3 },
            CounterKind::Translated {
                from: Granularity::Minute,
                to: Granularity::Second,
                inner: Box::new(CounterKind::default_tree()),
            },
        ];
        for (i, kind) in kinds.iter().enumerate() {
            let counter = kind.build(&backend, &format!("c{i}")).unwrap();
            counter.increment(&ctx, 7, 2).unwrap();
            counter.increment(&ctx, 9, 3).unwrap();
            assert_eq!(counter.query_sum(&ctx, 0, 8).unwrap(), 2, "{kind}");
            assert_eq!(counter.query_sum(&ctx, 8, 20).unwrap(), 3, "{kind}");
        }
    }

    #[test]
    fn test_build_rejects_bad_shapes() {
        let backend = MemoryBackend::new();
        assert_eq!(
            CounterKind::Tree { height: 0, bit_width: 2 }.build(&backend, "").unwrap_err(),
            ConfigError::ZeroHeight
        );
        let nested = CounterKind::Translated {
            from: Granularity::Hour,
            to: Granularity::Second,
            inner: Box::new(CounterKind::Tree { height: 3, bit_width: 65 }),
        };
        assert_eq!(
            nested.build(&backend, "").unwrap_err(),
            ConfigError::BitWidthTooLarge { bit_width: 65 }
        );
        let coarser = CounterKind::Translated {
            from: Granularity::Second,
            to: Granularity::Minute,
            inner: Box::new(CounterKind::Linear),
        };
        assert!(matches!(
            coarser.build(&backend, ""),
            Err(ConfigError::CoarserTarget { .. })
        ));
    }

    #[test]
    fn test_namespace_reaches_bottom_counter() {
        let backend = MemoryBackend::new();
        let kind = CounterKind::Translated {
            from: Granularity::Minute,
            to: Granularity::Second,
            inner: Box::new(CounterKind::Linear),
        };
        let counter = kind.build(&backend, "ns").unwrap();
        counter.increment(&Context::background(), 2, 1).unwrap();
        assert_eq!(backend.get("ns@120"), 1);
    }

    #[test]
    fn test_build_time_kinds() {
        let backend = MemoryBackend::new();
        let ctx = Context::background();
        let at = UNIX_EPOCH + Duration::from_secs(1_546_304_461);
        let kinds = [
            TimeCounterKind::Linear { granularity: Granularity::Minute },
            TimeCounterKind::Bucketed {
                granularity: Granularity::Minute,
                inner: CounterKind::default_tree(),
            },
        ];
        for (i, kind) in kinds.iter().enumerate() {
            let counter = kind.build(&backend, &format!("t{i}")).unwrap();
            assert_eq!(counter.granularity(), Granularity::Minute);
            assert_eq!(kind.granularity(), Granularity::Minute);
            counter.increment(&ctx, at, 4).unwrap();
            assert_eq!(counter.query_sum(&ctx, at, 1).unwrap(), 4, "{kind}");
        }
        assert_eq!(backend.get("t0:minute:1546304460"), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(CounterKind::Linear.to_string(), "linear");
        assert_eq!(CounterKind::default().to_string(), "tree(8,2)");
        let kind = TimeCounterKind::Bucketed {
            granularity: Granularity::Hour,
            inner: CounterKind::Translated {
                from: Granularity::Hour,
                to: Granularity::Second,
                inner: Box::new(CounterKind::Linear),
            },
        };
        assert_eq!(kind.to_string(), "hour hour->second linear");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json() {
        let kind = TimeCounterKind::from_json(
            r#"{
                "kind": "bucketed",
                "granularity": "hour",
                "inner": {
                    "kind": "translated",
                    "from": "hour",
                    "to": "second",
                    "inner": { "kind": "tree", "height": 16, "bit_width": 2 }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            kind,
            TimeCounterKind::Bucketed {
                granularity: Granularity::Hour,
                inner: CounterKind::Translated {
                    from: Granularity::Hour,
                    to: Granularity::Second,
                    inner: Box::new(CounterKind::Tree { height: 16, bit_width: 2 }),
                },
            }
        );
        assert_eq!(CounterKind::from_json(r#"{"kind":"linear"}"#).unwrap(), CounterKind::Linear);
        assert!(CounterKind::from_json(r#"{"kind":"fenwick"}"#).is_err());
    }
}
