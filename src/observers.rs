//! Renderers for backend key-touch statistics.
//!
//! Counters of different shapes answer the same queries; what tells them
//! apart is how many backend keys they touch. The observers in this module
//! turn the [`BackendStats`](crate::backend::BackendStats) collected by an
//! [`InstrumentedBackend`](crate::backend::InstrumentedBackend) into output
//! for people or tools:
//!
//! - [`table`] - Pretty-print statistics as tables using the `tabled` crate
//! - [`json`] - Serialize statistics to JSON
//!
//! # Feature Flags
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `full` - Enables both
//!
//! # Example
//!
//! ```rust,ignore
//! use sommatori::backend::{InstrumentedBackend, MemoryBackend};
//! use sommatori::observers::Result;
//!
//! fn report(backends: &[InstrumentedBackend<MemoryBackend>]) -> Result<()> {
//!     let stats: Vec<_> = backends.iter().map(|b| b.stats()).collect();
//!
//!     #[cfg(feature = "table")]
//!     println!("{}", sommatori::observers::table::TableObserver::new().render(&stats));
//!
//!     #[cfg(feature = "json")]
//!     println!("{}", sommatori::observers::json::JsonObserver::new().to_json(&stats)?);
//!
//!     Ok(())
//! }
//! ```

mod error;

pub use error::{ObserverError, Result};

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
