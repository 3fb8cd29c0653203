//! Table observer for pretty-printing backend statistics.
//!
//! [`TableObserver`] renders one row per [`BackendStats`] using the `tabled`
//! crate. Requires the `table` feature.
//!
//! # Example
//!
//! ```rust
//! use sommatori::backend::{InstrumentedBackend, MemoryBackend};
//! use sommatori::context::Context;
//! use sommatori::counters::linear::LinearCounter;
//! use sommatori::counters::RangeCounter;
//! use sommatori::observers::table::{TableObserver, TableStyle};
//!
//! let backend = InstrumentedBackend::new(MemoryBackend::new()).with_name("linear");
//! let counter = LinearCounter::new(&backend);
//! counter.query_sum(&Context::background(), 0, 99).unwrap();
//!
//! let output = TableObserver::new()
//!     .with_style(TableStyle::Ascii)
//!     .render([&backend.stats()]);
//! assert!(output.contains("linear"));
//! assert!(output.contains("100"));
//! // +---------+---------+-----------+------------+------------+--------------+----------------+
//! // | Backend | Queries | Keys read | Keys/query | Increments | Keys written | Keys/increment |
//! // +---------+---------+-----------+------------+------------+--------------+----------------+
//! // | linear  | 1       | 100       | 100.0      | 0          | 0            | 0.0            |
//! // +---------+---------+-----------+------------+------------+--------------+----------------+
//! ```

use std::io::Write;

use tabled::settings::object::Rows;
use tabled::settings::{Remove, Style};
use tabled::{Table, Tabled};

use crate::backend::BackendStats;
use crate::observers::Result;

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// GitHub-flavored Markdown table
    Markdown,
    /// No borders, just spacing
    Blank,
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row.
    pub show_header: bool,
    /// Line printed above the table.
    pub title: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
        }
    }
}

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Backend")]
    name: String,
    #[tabled(rename = "Queries")]
    query_calls: u64,
    #[tabled(rename = "Keys read")]
    query_keys: u64,
    #[tabled(rename = "Keys/query")]
    keys_per_query: String,
    #[tabled(rename = "Increments")]
    increment_calls: u64,
    #[tabled(rename = "Keys written")]
    increment_keys: u64,
    #[tabled(rename = "Keys/increment")]
    keys_per_increment: String,
}

impl From<&BackendStats> for StatsRow {
    fn from(stats: &BackendStats) -> Self {
        Self {
            name: if stats.name.is_empty() {
                "(unnamed)".to_string()
            } else {
                stats.name.clone()
            },
            query_calls: stats.query_calls,
            query_keys: stats.query_keys,
            keys_per_query: format!("{:.1}", stats.keys_per_query()),
            increment_calls: stats.increment_calls,
            increment_keys: stats.increment_keys,
            keys_per_increment: format!("{:.1}", stats.keys_per_increment()),
        }
    }
}

/// An observer that renders backend statistics as a formatted table.
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    ///
    /// Default style is [`TableStyle::Rounded`] with a header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets a title printed above the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    /// Renders one row per statistics entry.
    pub fn render<'a>(&self, stats: impl IntoIterator<Item = &'a BackendStats>) -> String {
        let rows: Vec<StatsRow> = stats.into_iter().map(StatsRow::from).collect();

        let mut table = Table::new(&rows);
        self.apply_style(&mut table);

        if !self.config.show_header {
            table.with(Remove::row(Rows::first()));
        }

        match &self.config.title {
            Some(title) => format!("{}\n{}", title, table),
            None => table.to_string(),
        }
    }

    /// Renders the table into `writer`, followed by a newline.
    pub fn write_to<'a>(
        &self,
        mut writer: impl Write,
        stats: impl IntoIterator<Item = &'a BackendStats>,
    ) -> Result<()> {
        writeln!(writer, "{}", self.render(stats))?;
        Ok(())
    }
}
