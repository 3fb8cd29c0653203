//! Range-sum counter backed by an implicit range tree.
//!
//! An increment at index `i` adds the delta to every node on `i`'s path, one
//! key per level. A query decomposes its range into disjoint subtree nodes
//! (see [`crate::tree`]) and reads only those, so it touches `O(H · 2^B)` keys
//! instead of one key per index.
//!
//! # Choosing a shape
//!
//! ```text
//!   keys per increment  = H
//!   keys per query      ≤ 2 · (H - 1) · (2^B - 1) + 2 + root gap
//! ```
//!
//! Smaller bit-widths and taller trees make queries cheap and increments
//! expensive; wide, short trees do the opposite. The root gap only matters
//! when a query spans more than `2^(B·(H-1))` indices.
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
//! let backend = InstrumentedBackend::new(MemoryBackend::new());
//! let counter = RangeTreeCounter::new(&backend, TreeShape::new(6, 2).unwrap());
//! let ctx = Context::background();
//!
//! for at in 0..1000 {
//!     counter.increment(&ctx, at, 1).unwrap();
//! }
//! backend.reset();
//!
//! assert_eq!(counter.query_sum(&ctx, 10, 989).unwrap(), 980);
//! assert!(backend.stats().query_keys < 40);
//! ```

use std::fmt::{self, Debug};

use tracing::debug;

use crate::backend::Backend;
use crate::context::Context;
use crate::counters::{read_sum, write_all, RangeCounter};
use crate::error::{ConfigError, Result};
use crate::tree::{TreeNode, TreeShape};

/// A [`RangeCounter`] storing per-subtree sums under path keys.
pub struct RangeTreeCounter<B> {
    backend: B,
    shape: TreeShape,
    namespace: String,
}

impl<B> RangeTreeCounter<B> {
    /// Creates a counter of the given shape writing to `backend`.
    pub fn new(backend: B, shape: TreeShape) -> Self {
        debug!(
            height = shape.height(),
            bit_width = shape.bit_width(),
            "range tree counter created"
        );
        Self {
            backend,
            shape,
            namespace: String::new(),
        }
    }

    /// Validates `(height, bit_width)` and creates the counter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::backend::MemoryBackend;
    /// use sommatori::counters::range_tree::RangeTreeCounter;
    /// use sommatori::error::ConfigError;
    ///
    /// assert!(RangeTreeCounter::with_shape(MemoryBackend::new(), 4, 2).is_ok());
    /// assert!(matches!(
    ///     RangeTreeCounter::with_shape(MemoryBackend::new(), 4, 0),
    ///     Err(ConfigError::ZeroBitWidth)
    /// ));
    /// ```
    pub fn with_shape(backend: B, height: u32, bit_width: u32) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(backend, TreeShape::new(height, bit_width)?))
    }

    /// Sets the key namespace, returning `self` for method chaining.
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..self
        }
    }

    /// Returns the tree shape.
    pub fn shape(&self) -> TreeShape {
        self.shape
    }

    /// Returns the key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns a reference to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Keys an increment at `at` writes, root first.
    pub fn increment_keys(&self, at: i64) -> Vec<String> {
        self.shape.path_keys(&self.namespace, at)
    }

    /// Disjoint subtree nodes covering `[from, to]`.
    pub fn query_nodes(&self, from: i64, to: i64) -> Vec<TreeNode> {
        self.shape.decompose(from, to)
    }

    /// Keys a query of `[from, to]` reads.
    pub fn query_keys(&self, from: i64, to: i64) -> Vec<String> {
        self.shape.range_keys(&self.namespace, from, to)
    }
}

impl<B: Backend> RangeCounter for RangeTreeCounter<B> {
    fn increment(&self, ctx: &Context, at: i64, by: i64) -> Result<()> {
        write_all(&self.backend, ctx, &self.increment_keys(at), by)
    }

    fn query_sum(&self, ctx: &Context, from: i64, to: i64) -> Result<i64> {
        read_sum(&self.backend, ctx, &self.query_keys(from, to))
    }
}

impl<B: Debug> Debug for RangeTreeCounter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeTreeCounter")
            .field("height", &self.shape.height())
            .field("bit_width", &self.shape.bit_width())
            .field("namespace", &self.namespace)
            .field("backend", &self.backend)
            .finish()
    }
}
