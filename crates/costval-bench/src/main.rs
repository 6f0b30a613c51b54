//! # costval-bench: DPconv vs. DPccp Cost Validation
//!
//! Batch driver that measures how much worse the join orders chosen by the
//! approximate DPconv enumerator are than the exact DPccp orders, when both are
//! replayed through the same hash-join cost model and ground-truth cardinalities.
//!
//! ## Pipeline
//!
//! ```text
//! *.csv ground truth (working directory)
//!   |
//!   +-> sample up to N files
//!   |
//!   +-> per file: <bench> <file.csv>      (external optimizer, with timeout)
//!   |              stdout: "Debug filename: <tree file>"  x2
//!   |
//!   +-> locate and read the cout (approx) and dpccp (exact) trees
//!   +-> evaluate both against the file's ground truth
//!   |
//!   v
//! report: per-query regression, effective count, mean regression
//! ```
//!
//! ## Configuration
//!
//! Defaults can be replaced by a TOML file (`--config`) and individual flags.
//! Logging is controlled by `RUST_LOG` (defaults to `costval=info`).

mod config;
mod discover;
mod error;
mod report;
mod runner;

use anyhow::Result;
use clap::Parser;
use costval_core::compare::compare_plans;
use costval_core::evaluate::CostEvaluator;
use costval_core::ground_truth::GroundTruth;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::report::{OutputFormat, Report, SkipReason};
use crate::runner::PlanTrees;

#[derive(Debug, Parser)]
#[command(name = "costval-bench", version, about = "Compare DPconv and DPccp join trees")]
struct Args {
    /// Directory holding the ground-truth .csv files.
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Optimizer benchmark binary.
    #[arg(long)]
    bench: Option<PathBuf>,

    /// Maximum number of ground-truth files to evaluate.
    #[arg(short = 'n', long)]
    sample_size: Option<usize>,

    /// Per-run benchmark timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Directory searched for join-tree files (repeatable).
    #[arg(long = "tree-dir")]
    tree_dirs: Vec<PathBuf>,

    /// Regression percentage up to which an instance counts as effective.
    #[arg(long)]
    threshold: Option<f64>,

    /// Seed for sampling.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl Args {
    fn into_config(self) -> Result<(DriverConfig, PathBuf, OutputFormat), DriverError> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::load(path)?,
            None => DriverConfig::default(),
        };
        if let Some(bench) = self.bench {
            config.bench_binary = bench;
        }
        if let Some(n) = self.sample_size {
            config.sample_size = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if !self.tree_dirs.is_empty() {
            config.tree_dirs = self.tree_dirs;
        }
        if let Some(threshold) = self.threshold {
            config.threshold_percent = threshold;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok((config, self.dir, self.format))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("costval=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let (config, dir, format) = Args::parse().into_config()?;
    let report = run_batch(&config, &dir).await?;
    println!("{}", report.render(format)?);
    Ok(())
}

async fn run_batch(config: &DriverConfig, dir: &Path) -> Result<Report, DriverError> {
    // The benchmark runs inside `dir`, so every path handed to it must be absolute.
    let dir = std::path::absolute(dir).map_err(|source| DriverError::Discover {
        dir: dir.to_path_buf(),
        source,
    })?;
    let dir = dir.as_path();

    let inputs = discover::discover_inputs(dir)?;
    if inputs.is_empty() {
        return Err(DriverError::NoInputs {
            dir: dir.to_path_buf(),
        });
    }

    let bench = dir.join(&config.bench_binary);
    if !bench.is_file() {
        return Err(DriverError::BenchNotFound { path: bench });
    }

    let evaluator = CostEvaluator::new(Arc::new(config.cost_model), config.fallback);
    let samples = discover::sample(&inputs, config.sample_size, config.seed);
    info!(samples = samples.len(), available = inputs.len(), "Starting comparison batch");

    let mut report = Report::new(config.threshold_percent);
    for (i, csv) in samples.iter().enumerate() {
        let query = csv
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| csv.display().to_string());
        info!("[{}/{}] Query: {}", i + 1, samples.len(), query);

        let truth = match GroundTruth::load(csv) {
            Ok(truth) if !truth.is_empty() => truth,
            Ok(_) => {
                warn!(query = %query, "Ground truth has no cardinality records");
                report.skip(query, SkipReason::GroundTruth);
                continue;
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Ground truth unavailable");
                report.skip(query, SkipReason::GroundTruth);
                continue;
            }
        };

        let stdout = match runner::run_bench(&bench, csv, dir, config.timeout()).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(query = %query, error = %e, "Benchmark failed");
                report.skip(query, SkipReason::Bench);
                continue;
            }
        };

        let Some((approx, exact)) = PlanTrees::from_output(&stdout, dir, &config.tree_dirs).complete()
        else {
            warn!(query = %query, "Join tree files not found");
            report.skip(query, SkipReason::TreesNotFound);
            continue;
        };

        let plans = compare_plans(&evaluator, &truth, &approx, &exact);
        info!(
            query = %query,
            diff_percent = format_args!("{:.2}", plans.comparison.diff_percent),
            degraded = plans.degradation().total(),
            "OK"
        );
        report.record(query, &plans);
    }

    Ok(report)
}
