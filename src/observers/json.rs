//! JSON observer for serializing backend statistics.
//!
//! [`JsonObserver`] serializes [`BackendStats`] with serde, either as a bare
//! array or wrapped in a [`StatsReport`] carrying a timestamp. Requires the
//! `json` feature.
//!
//! # Example
//!
//! ```rust
//! use sommatori::backend::BackendStats;
//! use sommatori::observers::json::JsonObserver;
//!
//! let stats = BackendStats {
//!     name: "tree".to_string(),
//!     query_calls: 1,
//!     query_keys: 12,
//!     ..Default::default()
//! };
//!
//! let json = JsonObserver::new().to_json([&stats]).unwrap();
//! assert_eq!(
//!     json,
//!     r#"[{"name":"tree","query_calls":1,"query_keys":12,"increment_calls":0,"increment_keys":0}]"#
//! );
//! ```

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::backend::BackendStats;
use crate::observers::Result;

/// A point-in-time capture of several backends' statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsReport {
    /// Optional timestamp in milliseconds since Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp_ms: Option<u64>,
    /// One entry per backend.
    pub backends: Vec<BackendStats>,
}

impl StatsReport {
    /// Creates a report without a timestamp.
    pub fn new(backends: Vec<BackendStats>) -> Self {
        Self {
            timestamp_ms: None,
            backends,
        }
    }

    /// Creates a report stamped with `timestamp_ms`.
    pub fn with_timestamp(backends: Vec<BackendStats>, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            backends,
        }
    }

    /// Finds a backend by name.
    pub fn get(&self, name: &str) -> Option<&BackendStats> {
        self.backends.iter().find(|b| b.name == name)
    }
}

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Whether to pretty-print the JSON output.
    pub pretty: bool,
    /// Whether to include a timestamp in the output.
    pub include_timestamp: bool,
    /// Whether to wrap the entries in a [`StatsReport`].
    pub wrap_in_report: bool,
}

/// An observer that serializes backend statistics to JSON.
///
/// ```rust
/// use sommatori::backend::BackendStats;
/// use sommatori::observers::json::{JsonObserver, StatsReport};
///
/// let observer = JsonObserver::new().wrap_in_report(true).include_timestamp(true);
/// let json = observer.to_json([&BackendStats::default()]).unwrap();
///
/// let report: StatsReport = serde_json::from_str(&json).unwrap();
/// assert!(report.timestamp_ms.is_some());
/// assert_eq!(report.backends.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables timestamp inclusion.
    ///
    /// Only has effect when `wrap_in_report` is also enabled.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Enables or disables wrapping the output in a [`StatsReport`].
    pub fn wrap_in_report(mut self, enabled: bool) -> Self {
        self.config.wrap_in_report = enabled;
        self
    }

    /// Builds the report this observer would serialize.
    pub fn report<'a>(&self, stats: impl IntoIterator<Item = &'a BackendStats>) -> StatsReport {
        let backends = stats.into_iter().cloned().collect();
        if self.config.include_timestamp {
            StatsReport::with_timestamp(backends, current_timestamp_ms())
        } else {
            StatsReport::new(backends)
        }
    }

    /// Serializes the statistics to a JSON string.
    pub fn to_json<'a>(&self, stats: impl IntoIterator<Item = &'a BackendStats>) -> Result<String> {
        let mut out = Vec::new();
        self.write_to(&mut out, stats)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Serializes the statistics into `writer`.
    pub fn write_to<'a>(
        &self,
        writer: impl Write,
        stats: impl IntoIterator<Item = &'a BackendStats>,
    ) -> Result<()> {
        let report = self.report(stats);
        match (self.config.wrap_in_report, self.config.pretty) {
            (true, true) => serde_json::to_writer_pretty(writer, &report)?,
            (true, false) => serde_json::to_writer(writer, &report)?,
            (false, true) => serde_json::to_writer_pretty(writer, &report.backends)?,
            (false, false) => serde_json::to_writer(writer, &report.backends)?,
        }
        Ok(())
    }
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
