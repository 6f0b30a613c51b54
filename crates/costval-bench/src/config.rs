//! # Driver Configuration
//!
//! Settings for a validation batch. Every field has a default, so a config file
//! only needs the keys it changes:
//!
//! ```toml
//! bench_binary = "../../src/build/bench"
//! sample_size = 50
//! seed = 7
//!
//! [cost_model]
//! build_factor = 1.2
//!
//! [fallback]
//! join_selectivity = 0.01
//! ```
//!
//! Command-line flags override values read from the file.

use costval_core::compare::DEFAULT_THRESHOLD_PERCENT;
use costval_core::cost::HashJoinCostModel;
use costval_core::evaluate::FallbackPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DriverError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// External optimizer benchmark, run once per ground-truth file.
    pub bench_binary: PathBuf,
    /// Maximum number of ground-truth files sampled per batch.
    pub sample_size: usize,
    /// Wall-clock limit for one benchmark run.
    pub timeout_secs: u64,
    /// Directories searched for the join-tree files named in the benchmark log,
    /// before the logged path itself.
    pub tree_dirs: Vec<PathBuf>,
    /// An instance counts as effective when its regression is at most this.
    pub threshold_percent: f64,
    /// Seed for sampling; entropy when absent.
    pub seed: Option<u64>,
    pub cost_model: HashJoinCostModel,
    pub fallback: FallbackPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bench_binary: PathBuf::from("../../src/build/bench"),
            sample_size: 100,
            timeout_secs: 30,
            tree_dirs: vec![
                PathBuf::from("../job_join_trees"),
                PathBuf::from("../../job_join_trees"),
            ],
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            seed: None,
            cost_model: HashJoinCostModel::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

impl DriverConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, DriverError> {
        toml::from_str(text).map_err(|source| DriverError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path).map_err(|source| DriverError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
