//! # Plan Comparison
//!
//! For each query instance the approximate plan (DPconv) and the exact plan
//! (DPccp) are costed under the same model and ground truth, and the regression of
//! the approximate plan is reported as a percentage of the exact plan's cost:
//!
//! ```text
//! diff_percent = (approx_cost - exact_cost) / max(exact_cost, 1) * 100
//! ```
//!
//! The approximation counts as effective for an instance when `diff_percent` does
//! not exceed the threshold (5% by default). `ValidationSummary` aggregates these
//! outcomes over a batch.

use crate::evaluate::{CostEvaluator, Degradation, Evaluation};
use crate::ground_truth::CardinalityCatalog;
use serde::{Deserialize, Serialize};

/// Threshold below which an approximate plan counts as effective.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 5.0;

/// Cost regression of one approximate plan against its exact counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub approx_cost: f64,
    pub exact_cost: f64,
    pub diff_percent: f64,
}

impl Comparison {
    pub fn new(approx_cost: f64, exact_cost: f64) -> Self {
        let denominator = exact_cost.max(1.0);
        Self {
            approx_cost,
            exact_cost,
            diff_percent: (approx_cost - exact_cost) / denominator * 100.0,
        }
    }

    pub fn is_effective(&self, threshold_percent: f64) -> bool {
        self.diff_percent <= threshold_percent
    }
}

/// Both evaluations of an instance and their comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanComparison {
    pub approx: Evaluation,
    pub exact: Evaluation,
    pub comparison: Comparison,
}

impl PlanComparison {
    /// Degradation summed over both plans.
    pub fn degradation(&self) -> Degradation {
        let mut total = self.approx.degradation;
        total += self.exact.degradation;
        total
    }
}

/// Evaluate the approximate and the exact plan of one instance and compare them.
pub fn compare_plans(
    evaluator: &CostEvaluator,
    catalog: &dyn CardinalityCatalog,
    approx_expr: &str,
    exact_expr: &str,
) -> PlanComparison {
    let approx = evaluator.evaluate_expression(approx_expr, catalog);
    let exact = evaluator.evaluate_expression(exact_expr, catalog);
    PlanComparison {
        approx,
        exact,
        comparison: Comparison::new(approx.hash_cost(), exact.hash_cost()),
    }
}

/// Aggregate outcome over a batch of instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub threshold_percent: f64,
    pub instances: usize,
    pub wins: usize,
    pub total_diff_percent: f64,
    pub degradation: Degradation,
}

impl Default for ValidationSummary {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PERCENT)
    }
}

impl ValidationSummary {
    pub fn new(threshold_percent: f64) -> Self {
        Self {
            threshold_percent,
            instances: 0,
            wins: 0,
            total_diff_percent: 0.0,
            degradation: Degradation::default(),
        }
    }

    pub fn record(&mut self, comparison: &Comparison, degradation: Degradation) {
        self.instances += 1;
        if comparison.is_effective(self.threshold_percent) {
            self.wins += 1;
        }
        self.total_diff_percent += comparison.diff_percent;
        self.degradation += degradation;
    }

    pub fn record_plans(&mut self, plans: &PlanComparison) {
        self.record(&plans.comparison, plans.degradation());
    }

    /// Mean diff percent, or `None` for an empty batch.
    pub fn mean_diff_percent(&self) -> Option<f64> {
        (self.instances > 0).then(|| self.total_diff_percent / self.instances as f64)
    }
}
