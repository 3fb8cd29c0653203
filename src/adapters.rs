//! Wrappers that change what a counter's index means.
//!
//! These wrap another counter and remap its inputs while keeping the same
//! capability traits, so they compose freely with every counter kind.
//!
//! # Available Wrappers
//!
//! | Wrapper | Description |
//! |---------|-------------|
//! | [`RangeTranslator`] | Serves coarse indices from a counter storing fine ones |
//! | [`BucketedTimeCounter`] | Serves timestamps from an integer counter |
//!
//! # Examples
//!
//! ## Minute queries on a per-second tree
//!
//! ```rust
//! use sommatori::adapters::RangeTranslator;
//! use sommatori::backend::MemoryBackend;
//! use sommatori::context::Context;
//! use sommatori::counters::range_tree::RangeTreeCounter;
//! use sommatori::counters::RangeCounter;
//! use sommatori::granularity::Granularity;
//! use sommatori::tree::TreeShape;
//!
//! let backend = MemoryBackend::new();
//! let per_second = RangeTreeCounter::new(&backend, TreeShape::new(12, 2).unwrap());
//! let ctx = Context::background();
//!
//! per_second.increment(&ctx, 59, 1).unwrap();
//! per_second.increment(&ctx, 60, 1).unwrap();
//!
//! let per_minute = RangeTranslator::new(&per_second, Granularity::Minute, Granularity::Second).unwrap();
//! assert_eq!(per_minute.query_sum(&ctx, 0, 0).unwrap(), 1);
//! assert_eq!(per_minute.query_sum(&ctx, 0, 1).unwrap(), 2);
//! ```
//!
//! ## Hourly buckets in a range tree
//!
//! ```rust
//! use sommatori::adapters::BucketedTimeCounter;
//! use sommatori::backend::MemoryBackend;
//! use sommatori::context::Context;
//! use sommatori::counters::range_tree::RangeTreeCounter;
//! use sommatori::counters::TimeRangeCounter;
//! use sommatori::granularity::Granularity;
//! use sommatori::tree::TreeShape;
//! use std::time::SystemTime;
//!
//! let backend = MemoryBackend::new();
//! let tree = RangeTreeCounter::new(&backend, TreeShape::default());
//! let hourly = BucketedTimeCounter::new(tree, Granularity::Hour);
//! let ctx = Context::background();
//!
//! hourly.increment(&ctx, SystemTime::now(), 1).unwrap();
//! assert_eq!(hourly.query_sum(&ctx, SystemTime::now(), 24).unwrap(), 1);
//! ```

mod bucketed;
mod translator;

pub use bucketed::BucketedTimeCounter;
pub use translator::RangeTranslator;
