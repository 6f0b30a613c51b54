//! # Cost Model
//!
//! This module defines the execution-cost abstraction used to score a join tree.
//!
//! ## Hash-Join Cost Model
//!
//! Every join is costed as a hash join in which the smaller input is built into an
//! in-memory hash table and the larger input is streamed through it as the probe
//! side:
//!
//! ```text
//! join_cost = build_factor * min(|L|, |R|) + probe_factor * max(|L|, |R|)
//! ```
//!
//! The defaults (1.2, 1.0) charge a 20% overhead for inserting a row into the hash
//! table over probing with one. Because the build side is chosen by size, the cost
//! of a join does not depend on which side of the expression an input appears on.
//!
//! ## Cost Accumulation
//!
//! Costs are **additive**: the cost of a plan is the sum of the local join costs of
//! all of its join nodes. Leaves cost nothing. The accumulation itself is done by
//! `crate::evaluate::CostEvaluator`.
//!
//! ## Pluggable Design
//!
//! The `CostModel` trait allows replaying the same recorded plans through a
//! different formula without touching the tree walk or the fallback policy.

use serde::{Deserialize, Serialize};

/// Trait for pluggable join cost models.
pub trait CostModel: Send + Sync {
    /// Local cost of joining two inputs with the given cardinalities.
    fn join_cost(&self, left_cardinality: f64, right_cardinality: f64) -> f64;
}

/// Hash-join cost model with the smaller input as the build side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashJoinCostModel {
    /// Cost per row inserted into the hash table (build side).
    pub build_factor: f64,
    /// Cost per row probed against the hash table (probe side).
    pub probe_factor: f64,
}

impl HashJoinCostModel {
    pub const DEFAULT_BUILD_FACTOR: f64 = 1.2;
    pub const DEFAULT_PROBE_FACTOR: f64 = 1.0;
}

impl Default for HashJoinCostModel {
    fn default() -> Self {
        Self {
            build_factor: Self::DEFAULT_BUILD_FACTOR,
            probe_factor: Self::DEFAULT_PROBE_FACTOR,
        }
    }
}

impl CostModel for HashJoinCostModel {
    fn join_cost(&self, left_cardinality: f64, right_cardinality: f64) -> f64 {
        let build = left_cardinality.min(right_cardinality);
        let probe = left_cardinality.max(right_cardinality);
        self.build_factor * build + self.probe_factor * probe
    }
}
