//! # Sommatori - Range-Sum Counters over Point Key-Value Stores
//!
//! A Rust library for counters whose queries ask for the **sum over a range**
//! of integer indices or time buckets, stored in a backend that only offers
//! batched point reads and batched additive writes.
//!
//! ## The Problem
//!
//! The obvious layout stores one key per index. Increments are a single write,
//! but a query over `n` indices reads `n` keys: a thirty-day window of
//! per-second counts is more than two and a half million reads.
//!
//! ## The Solution: Implicit Range Trees
//!
//! A [`RangeTreeCounter`](counters::range_tree::RangeTreeCounter) keeps the
//! sum of every subtree of an implicit tree of height `H`, where each
//! non-root level splits its parent into `2^B` children. An increment writes
//! the `H` nodes on the index's path; a query covers its range with disjoint
//! subtrees and reads only those.
//!
//! ```text
//!   H = 3, B = 2, query [1, 14]
//!
//!   level 0                         :0
//!                 ┌──────────┬──────┴───┬──────────┐
//!   level 1     :0:0       :0:1 *     :0:2 *     :0:3
//!            ┌──┬─┴┬──┐                       ┌──┬─┴┬──┐
//!   level 2  0  1* 2* 3*                      12* 13* 14* 15
//!
//!   * = read: 7 keys instead of 14
//! ```
//!
//! ### Design Principles
//!
//! 1. **Point keys only**: Backends implement two batched calls, `query` and
//!    `increment`. Every counter kind, tree or not, goes through them.
//!
//! 2. **One call per operation**: An increment writes all its keys in one
//!    `increment` call and a query reads all of its keys in one `query` call.
//!
//! 3. **Same answers, different costs**: Every counter kind returns identical
//!    sums for identical histories. They differ only in the keys they touch,
//!    which [`InstrumentedBackend`](backend::InstrumentedBackend) measures.
//!
//! 4. **Checked arithmetic**: Index scaling and sums never wrap; overflow is
//!    reported as an error.
//!
//! ## Available Counter Types
//!
//! | Type | Description | Use Case |
//! |------|-------------|----------|
//! | [`LinearCounter`](counters::linear::LinearCounter) | One key per index | Reference, short ranges |
//! | [`RangeTreeCounter`](counters::range_tree::RangeTreeCounter) | Implicit range tree | Long ranges |
//! | [`RangeTranslator`](adapters::RangeTranslator) | Coarse indices over a fine counter | Minutes from a per-second store |
//! | [`LinearTimeCounter`](counters::linear_time::LinearTimeCounter) | One key per time bucket | Reference, short windows |
//! | [`BucketedTimeCounter`](adapters::BucketedTimeCounter) | Time buckets in an integer counter | Long windows |
//!
//! ## Quick Start
//!
//! ```rust
//! use sommatori::backend::MemoryBackend;
//! use sommatori::context::Context;
//! use sommatori::counters::{TimeCounter, TimeRangeCounter};
//! use sommatori::granularity::Granularity;
//! use sommatori::tree::TreeShape;
//! use std::time::SystemTime;
//!
//! let backend = MemoryBackend::new();
//! let logins = TimeCounter::tree(&backend, Granularity::Hour, TreeShape::default());
//! let ctx = Context::background();
//!
//! logins.increment(&ctx, SystemTime::now(), 1).unwrap();
//!
//! // logins over the last thirty days
//! let total = logins.query_sum(&ctx, SystemTime::now(), 30 * 24).unwrap();
//! assert_eq!(total, 1);
//! ```
//!
//! ## Backends
//!
//! Implement [`Backend`](backend::Backend) for your store. The crate ships a
//! sharded, thread-safe [`MemoryBackend`](backend::MemoryBackend) and the
//! [`InstrumentedBackend`](backend::InstrumentedBackend) wrapper. Every
//! operation takes a [`Context`](context::Context) carrying cancellation and
//! an optional deadline, which backends should honour.
//!
//! ## Observers
//!
//! Key-touch statistics can be exported with the optional observer modules:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `table` | [`observers::table`] | Pretty-print statistics as ASCII tables |
//! | `json` | [`observers::json`] | Serialize statistics to JSON |
//! | `full` | All observers | Enables all observer modules |
//!
//! The `serde` feature derives `Serialize`/`Deserialize` for the
//! [`config`] descriptions, [`Granularity`](granularity::Granularity) and
//! [`BackendStats`](backend::BackendStats).

pub mod adapters;
pub mod backend;
pub mod config;
pub mod context;
pub mod counters;
pub mod error;
pub mod granularity;
pub mod observers;
pub mod tree;
