//! The storage boundary every counter writes through.
//!
//! A [`Backend`] is a point key-value store with two batched operations: read
//! a list of keys, and add a delta to each of a list of keys. There is no range
//! scan; range queries are built by the counters out of point reads.
//!
//! # Contract
//!
//! - `query` returns exactly one value per key, in key order. Missing keys read
//!   as zero. A call either returns every value or fails.
//! - `increment` adds `deltas[i]` to `keys[i]`, creating absent keys. Each key
//!   is updated atomically on its own; nothing is promised across keys.
//! - Both accept an empty key list.
//! - Retries, backoff and reconnection belong to the implementation. The
//!   counters never retry.
//!
//! # Implementations
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MemoryBackend`] | Sharded in-process map, for tests and single-process use |
//! | [`InstrumentedBackend`] | Wraps any backend and counts calls and keys touched |
//!
//! # Example
//!
//! ```rust
//! use sommatori::backend::{Backend, MemoryBackend};
//! use sommatori::context::Context;
//!
//! let backend = MemoryBackend::new();
//! let ctx = Context::background();
//! let keys = vec!["a".to_string(), "b".to_string()];
//!
//! backend.increment(&ctx, &keys, &[3, -1]).unwrap();
//! backend.increment(&ctx, &keys[..1], &[2]).unwrap();
//! assert_eq!(backend.query(&ctx, &keys).unwrap(), vec![5, -1]);
//! ```

mod instrumented;
mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use crate::context::Context;
use crate::error::BackendError;

pub use instrumented::{BackendStats, InstrumentedBackend};
pub use memory::MemoryBackend;

/// A point key-value store with batched reads and additive writes.
pub trait Backend: Debug {
    /// Reads `keys`, returning one value per key in the same order.
    fn query(&self, ctx: &Context, keys: &[String]) -> Result<Vec<i64>, BackendError>;

    /// Adds `deltas[i]` to `keys[i]` for every `i`.
    fn increment(&self, ctx: &Context, keys: &[String], deltas: &[i64]) -> Result<(), BackendError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn query(&self, ctx: &Context, keys: &[String]) -> Result<Vec<i64>, BackendError> {
        (**self).query(ctx, keys)
    }

    fn increment(&self, ctx: &Context, keys: &[String], deltas: &[i64]) -> Result<(), BackendError> {
        (**self).increment(ctx, keys, deltas)
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn query(&self, ctx: &Context, keys: &[String]) -> Result<Vec<i64>, BackendError> {
        (**self).query(ctx, keys)
    }

    fn increment(&self, ctx: &Context, keys: &[String], deltas: &[i64]) -> Result<(), BackendError> {
        (**self).increment(ctx, keys, deltas)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn query(&self, ctx: &Context, keys: &[String]) -> Result<Vec<i64>, BackendError> {
        (**self).query(ctx, keys)
    }

    fn increment(&self, ctx: &Context, keys: &[String], deltas: &[i64]) -> Result<(), BackendError> {
        (**self).increment(ctx, keys, deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_through_arc() {
        let backend = Arc::new(MemoryBackend::new());
        let a = Arc::clone(&backend);
        let ctx = Context::background();
        a.increment(&ctx, &["k".to_string()], &[4]).unwrap();
        assert_eq!(backend.query(&ctx, &["k".to_string()]).unwrap(), vec![4]);
    }

    #[test]
    fn test_dyn_backend() {
        let backend: Box<dyn Backend> = Box::new(MemoryBackend::new());
        let ctx = Context::background();
        backend.increment(&ctx, &["k".to_string()], &[1]).unwrap();
        assert_eq!((&backend).query(&ctx, &["k".to_string()]).unwrap(), vec![1]);
    }
}
