//! Sharded in-memory backend.
//!
//! Keys are spread over [`NUM_SHARDS`] independent maps, each behind its own
//! mutex and padded to its own cache line, so increments of unrelated keys
//! from different threads rarely contend.
//!
//! ```text
//!   key ──hash──► shard = hash % 64
//!                   │
//!   ┌───────────────▼─────────────────────────┐
//!   │ [Shard 0] Mutex<HashMap> (CachePadded)  │
//!   │ [Shard 1] Mutex<HashMap> (CachePadded)  │
//!   │    ...                                  │
//!   │ [Shard 63] Mutex<HashMap> (CachePadded) │
//!   └─────────────────────────────────────────┘
//! ```

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::BuildHasher;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_utils::CachePadded;

use crate::backend::Backend;
use crate::context::Context;
use crate::error::BackendError;

/// Number of independently locked shards.
pub(crate) const NUM_SHARDS: usize = 64;

type Shard = CachePadded<Mutex<HashMap<String, i64>>>;

/// Thread-safe in-memory [`Backend`].
///
/// Each key is updated under its shard's lock, which makes additive
/// increments atomic per key. Values that would overflow `i64` are rejected
/// and leave the key unchanged.
///
/// # Examples
///
/// ```rust
/// use sommatori::backend::{Backend, MemoryBackend};
/// use sommatori::context::Context;
///
/// let backend = MemoryBackend::new();
/// let ctx = Context::background();
///
/// backend.increment(&ctx, &["views".to_string()], &[10]).unwrap();
/// assert_eq!(backend.get("views"), 10);
/// assert_eq!(backend.get("missing"), 0);
/// ```
pub struct MemoryBackend {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS)
            .map(|_| CachePadded::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, key: &str) -> MutexGuard<'_, HashMap<String, i64>> {
        let idx = (self.hasher.hash_one(key) % NUM_SHARDS as u64) as usize;
        // A panic while holding the lock cannot leave a half-applied addition.
        self.shards[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value stored at `key`, zero if absent.
    pub fn get(&self, key: &str) -> i64 {
        self.shard(key).get(key).copied().unwrap_or(0)
    }

    /// Number of keys ever written.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Returns `true` if no key was ever written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored keys and values, sorted by key.
    pub fn entries(&self) -> Vec<(String, i64)> {
        let mut entries: Vec<(String, i64)> = self
            .shards
            .iter()
            .flat_map(|s| {
                s.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect::<Vec<_>>()
            })
            .collect();
        entries.sort();
        entries
    }
}

impl Backend for MemoryBackend {
    fn query(&self, ctx: &Context, keys: &[String]) -> Result<Vec<i64>, BackendError> {
        ctx.check_backend()?;
        Ok(keys.iter().map(|key| self.get(key)).collect())
    }

    fn increment(&self, ctx: &Context, keys: &[String], deltas: &[i64]) -> Result<(), BackendError> {
        if keys.len() != deltas.len() {
            return Err(BackendError::LengthMismatch {
                keys: keys.len(),
                deltas: deltas.len(),
            });
        }
        ctx.check_backend()?;

        for (key, &delta) in keys.iter().zip(deltas) {
            let mut shard = self.shard(key);
            let value = shard.entry(key.clone()).or_insert(0);
            *value = value
                .checked_add(delta)
                .ok_or_else(|| BackendError::Other(format!("value of {key:?} overflows").into()))?;
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MemoryBackend {
    /// Formats the backend showing the number of keys per non-empty shard.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryBackend{{")?;
        for (i, shard) in self.shards.iter().enumerate() {
            let len = shard.lock().unwrap_or_else(PoisonError::into_inner).len();
            if len != 0 {
                write!(f, " [{i}]:{len}")?;
            }
        }
        write!(f, " }}")
    }
}
