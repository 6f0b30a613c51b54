//! # costval-core: Join-Tree Cost Evaluation
//!
//! This crate replays recorded join trees through a shared hash-join cost formula
//! so that plans produced by different join-ordering algorithms (the approximate
//! DPconv enumerator and the exact DPccp baseline) can be compared on equal terms.
//!
//! ## Module Overview
//!
//! - **`relset`**: `RelationSet`, a bitmask of participating base relations.
//! - **`ground_truth`**: Loader for per-query ground-truth statistics and the
//!   `CardinalityCatalog` trait the evaluator reads them through.
//! - **`tree`**: Parser for the bracketed `(L|R)` join-tree grammar into `JoinTree`.
//! - **`cost`**: Cost model trait and the default hash-join cost model.
//! - **`evaluate`**: Bottom-up cost fold over a `JoinTree`, with fallback policy and
//!   degradation accounting.
//! - **`compare`**: Relative cost regression between two plans and the batch summary.

pub mod compare;
pub mod cost;
pub mod evaluate;
pub mod ground_truth;
pub mod relset;
pub mod tree;

pub use compare::{compare_plans, Comparison, PlanComparison, ValidationSummary};
pub use cost::{CostModel, HashJoinCostModel};
pub use evaluate::{CostEvaluator, CostResult, Degradation, Evaluation, FallbackPolicy};
pub use ground_truth::{CardinalityCatalog, GroundTruth, LoadError};
pub use relset::RelationSet;
pub use tree::JoinTree;
