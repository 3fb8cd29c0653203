//! Error types shared by every counter.
//!
//! Construction problems surface as [`ConfigError`], storage failures as
//! [`BackendError`], and both are carried by the crate level [`Error`] together
//! with the operation that was running when they happened.
//!
//! # Example
//!
//! ```rust
//! use sommatori::error::{ConfigError, Error};
//! use sommatori::tree::TreeShape;
//!
//! let err = TreeShape::new(0, 2).unwrap_err();
//! assert!(matches!(err, ConfigError::ZeroHeight));
//!
//! let err: Error = err.into();
//! assert!(err.to_string().contains("height"));
//! ```

use std::fmt::{self, Display};

use thiserror::Error;

use crate::granularity::Granularity;

/// Invalid construction parameters. Never recoverable: the counter is not built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The tree needs at least one level.
    #[error("tree height must be at least 1")]
    ZeroHeight,

    /// Every non-root level needs at least one bit.
    #[error("tree bit-width must be at least 1")]
    ZeroBitWidth,

    /// Indices are 64 bits wide; wider levels cannot hold anything.
    #[error("tree bit-width {bit_width} exceeds the 64-bit index width")]
    BitWidthTooLarge {
        /// The rejected bit-width.
        bit_width: u32,
    },

    /// A translator can only expand a coarse index into a finer one.
    #[error("cannot translate {from} indices into coarser {to} indices")]
    CoarserTarget {
        /// Granularity of the indices the caller uses.
        from: Granularity,
        /// Granularity of the indices the inner counter stores.
        to: Granularity,
    },

    /// A translator factor must be a positive integer.
    #[error("translator factor must be positive, got {factor}")]
    NonPositiveFactor {
        /// The rejected factor.
        factor: i64,
    },
}

/// Failure reported by a [`Backend`](crate::backend::Backend) implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store could not be reached or refused the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// `increment` was called with a different number of keys and deltas.
    #[error("{keys} keys but {deltas} deltas")]
    LengthMismatch {
        /// Number of keys supplied.
        keys: usize,
        /// Number of deltas supplied.
        deltas: usize,
    },

    /// `query` answered with a different number of values than keys asked.
    #[error("expected {expected} values, backend returned {actual}")]
    ResponseMismatch {
        /// Number of keys queried.
        expected: usize,
        /// Number of values returned.
        actual: usize,
    },

    /// The backend observed cancellation of the caller's context.
    #[error("cancelled")]
    Cancelled,

    /// The backend observed the caller's deadline passing.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Any other implementation specific failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The backend operation an [`Error::Backend`] happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Additive update of one or more keys.
    Increment,
    /// Batched point read.
    Query,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Increment => f.write_str("increment"),
            Operation::Query => f.write_str("query"),
        }
    }
}

/// Error type for every counter operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction parameters.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The backend failed; `keys` is the key set the call carried.
    #[error("{op} of {} key(s) failed: {source}", .keys.len())]
    Backend {
        /// Which backend call failed.
        op: Operation,
        /// Keys passed to the failing call.
        keys: Vec<String>,
        /// The backend's own error.
        #[source]
        source: BackendError,
    },

    /// The caller cancelled the context before the backend was reached.
    #[error("operation cancelled")]
    Cancelled,

    /// The context deadline passed before the backend was reached.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Scaling or offsetting an index left the `i64` range.
    #[error("index {index} overflows during {op}")]
    IndexOverflow {
        /// Operation being prepared.
        op: Operation,
        /// The index that could not be mapped.
        index: i64,
    },

    /// The stored values do not fit in an `i64` sum.
    #[error("range sum overflows i64")]
    SumOverflow,
}

impl Error {
    pub(crate) fn backend(op: Operation, keys: &[String], source: BackendError) -> Self {
        Error::Backend {
            op,
            keys: keys.to_vec(),
            source,
        }
    }

    /// Returns `true` when the error comes from cancellation or an elapsed
    /// deadline, whether observed by the core or by the backend.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Error::Cancelled
                | Error::DeadlineExceeded
                | Error::Backend {
                    source: BackendError::Cancelled | BackendError::DeadlineExceeded,
                    ..
                }
        )
    }
}

/// Result type for counter operations.
pub type Result<T> = std::result::Result<T, Error>;
