//! Demo comparing the key cost of linear and range-tree counters.
//!
//! Replays the same seeded workload against a linear counter and a set of
//! tree shapes, checks every query answers identically, and prints how many
//! backend keys each one touched.
//!
//! Run with:
//! ```bash
//! cargo run --example demo --features demo -- --help
//! cargo run --example demo --features demo -- --shape 8x2 --shape 4x4 --width 5000
//! ```

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sommatori::backend::{BackendStats, InstrumentedBackend, MemoryBackend};
use sommatori::config::CounterKind;
use sommatori::context::Context;
use sommatori::counters::{IntCounter, RangeCounter};
use sommatori::observers::json::JsonObserver;
use sommatori::observers::table::{TableObserver, TableStyle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Output format for the statistics.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty ASCII table
    Table,
    /// JSON format
    Json,
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Markdown,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Demo application for sommatori - range-sum counters over key-value stores.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tree shapes to compare, as HEIGHTxBIT_WIDTH
    #[arg(long = "shape", value_parser = parse_shape, default_values = ["8x2", "6x3", "4x4"])]
    shapes: Vec<CounterKind>,

    /// Counter description in JSON, in addition to the shapes
    #[arg(long)]
    counter: Vec<String>,

    /// Number of increments
    #[arg(long, default_value = "10000")]
    increments: usize,

    /// Number of range queries
    #[arg(long, default_value = "1000")]
    queries: usize,

    /// Indices are drawn from [0, RANGE)
    #[arg(long, default_value = "100000")]
    range: i64,

    /// Maximum query width
    #[arg(long, default_value = "10000")]
    width: i64,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Table style
    #[arg(short, long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Add a title to the table
    #[arg(long)]
    title: Option<String>,

    /// Hide the table header
    #[arg(long)]
    no_header: bool,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include timestamp in JSON output
    #[arg(long)]
    timestamp: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log: String,
}

fn parse_shape(s: &str) -> Result<CounterKind, String> {
    let (height, bit_width) = s
        .split_once('x')
        .ok_or_else(|| format!("expected HEIGHTxBIT_WIDTH, got {s:?}"))?;
    let height = height.parse().map_err(|e| format!("height: {e}"))?;
    let bit_width = bit_width.parse().map_err(|e| format!("bit-width: {e}"))?;
    Ok(CounterKind::Tree { height, bit_width })
}

struct Candidate {
    kind: CounterKind,
    backend: InstrumentedBackend<MemoryBackend>,
}

impl Candidate {
    fn new(kind: CounterKind) -> Self {
        let backend = InstrumentedBackend::new(MemoryBackend::new()).with_name(kind.to_string());
        Self { kind, backend }
    }

    fn counter(&self) -> Result<IntCounter<&InstrumentedBackend<MemoryBackend>>, Box<dyn std::error::Error>> {
        Ok(self.kind.build(&self.backend, "")?)
    }
}

fn run(args: &Args) -> Result<Vec<BackendStats>, Box<dyn std::error::Error>> {
    let mut candidates = vec![Candidate::new(CounterKind::Linear)];
    candidates.extend(args.shapes.iter().cloned().map(Candidate::new));
    for json in &args.counter {
        candidates.push(Candidate::new(CounterKind::from_json(json)?));
    }

    let counters = candidates
        .iter()
        .map(Candidate::counter)
        .collect::<Result<Vec<_>, _>>()?;
    let ctx = Context::background();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let range = args.range.max(1);
    let width = args.width.clamp(1, range);

    info!(counters = counters.len(), increments = args.increments, "replaying increments");
    for _ in 0..args.increments {
        let at = rng.gen_range(0..range);
        let by = rng.gen_range(1..=10);
        for counter in &counters {
            counter.increment(&ctx, at, by)?;
        }
    }

    info!(queries = args.queries, "replaying queries");
    let mut mismatches = 0usize;
    for _ in 0..args.queries {
        let from = rng.gen_range(0..range);
        let to = from.saturating_add(rng.gen_range(0..width));
        let mut sums = counters.iter().map(|c| c.query_sum(&ctx, from, to));
        let expected = sums.next().transpose()?.unwrap_or(0);
        for (sum, candidate) in sums.zip(&candidates[1..]) {
            let sum = sum?;
            if sum != expected {
                error!(kind = %candidate.kind, from, to, sum, expected, "sum mismatch");
                mismatches += 1;
            }
        }
    }
    if mismatches > 0 {
        return Err(format!("{mismatches} queries disagreed with the linear counter").into());
    }

    Ok(candidates.iter().map(|c| c.backend.stats()).collect())
}

fn render_output(args: &Args, stats: &[BackendStats]) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match args.format {
        OutputFormat::Table => {
            let mut observer = TableObserver::new()
                .with_style(args.style.into())
                .with_header(!args.no_header);
            if let Some(title) = &args.title {
                observer = observer.with_title(title);
            }
            observer.render(stats)
        }
        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .wrap_in_report(args.timestamp)
            .include_timestamp(args.timestamp)
            .to_json(stats)?,
    })
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)))
        .with_writer(std::io::stderr)
        .init();

    match run(&args).and_then(|stats| render_output(&args, &stats)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "demo failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
