//! # Join-Tree Cost Evaluation
//!
//! `CostEvaluator` folds a `JoinTree` bottom-up against a `CardinalityCatalog`,
//! producing for every node a `CostResult` of (cardinality, accumulated hash cost,
//! relation set). The root result is the plan's cost.
//!
//! ## Per-Node Rules
//!
//! - **Leaf**: relation set `1 << index`, cardinality from the catalog, cost 0.
//! - **Join**: relation set is the union of the inputs; cardinality comes from the
//!   catalog for that exact set, or is estimated from the inputs; the local cost
//!   comes from the `CostModel` and is added to both inputs' accumulated costs.
//! - **Malformed**: a fixed fallback result with an empty relation set.
//!
//! ## Degrade, Don't Crash
//!
//! Ground-truth files only cover sub-joins the exact enumerator visited, and
//! recorded trees are occasionally corrupt. None of this is an error here: each
//! gap is filled from `FallbackPolicy` and counted in `Degradation`, so a batch
//! report can show how much of a result rests on placeholders.

use crate::cost::{CostModel, HashJoinCostModel};
use crate::ground_truth::CardinalityCatalog;
use crate::relset::RelationSet;
use crate::tree::JoinTree;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::{debug, trace};

/// Placeholder values used where ground truth or the expression itself is lacking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    /// Cardinality of a leaf whose relation is unknown or has no record.
    pub leaf_cardinality: f64,
    /// Multiplier applied to the cross product of the inputs when a join's
    /// relation set has no record.
    pub join_selectivity: f64,
    /// Cardinality reported for a malformed subtree.
    pub malformed_cardinality: f64,
}

impl FallbackPolicy {
    pub const DEFAULT_LEAF_CARDINALITY: f64 = 1000.0;
    pub const DEFAULT_JOIN_SELECTIVITY: f64 = 0.01;
    pub const DEFAULT_MALFORMED_CARDINALITY: f64 = 1000.0;
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            leaf_cardinality: Self::DEFAULT_LEAF_CARDINALITY,
            join_selectivity: Self::DEFAULT_JOIN_SELECTIVITY,
            malformed_cardinality: Self::DEFAULT_MALFORMED_CARDINALITY,
        }
    }
}

/// Result for one node of a join tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostResult {
    /// Output cardinality of the node.
    pub cardinality: f64,
    /// Hash-join cost accumulated over the node's subtree.
    pub hash_cost: f64,
    /// Base relations covered by the node.
    pub relations: RelationSet,
}

/// Counts of nodes whose result came from a fallback rather than ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// Subtrees that did not parse.
    pub malformed_nodes: usize,
    /// Leaves naming a relation absent from the catalog (mapped to bit 0).
    pub unknown_relations: usize,
    /// Known leaves with no recorded cardinality.
    pub missing_leaf_cardinalities: usize,
    /// Joins whose cardinality was estimated from their inputs.
    pub estimated_joins: usize,
}

impl Degradation {
    pub fn total(&self) -> usize {
        self.malformed_nodes
            + self.unknown_relations
            + self.missing_leaf_cardinalities
            + self.estimated_joins
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

impl AddAssign for Degradation {
    fn add_assign(&mut self, rhs: Self) {
        self.malformed_nodes += rhs.malformed_nodes;
        self.unknown_relations += rhs.unknown_relations;
        self.missing_leaf_cardinalities += rhs.missing_leaf_cardinalities;
        self.estimated_joins += rhs.estimated_joins;
    }
}

/// The root result of a tree together with its degradation counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub result: CostResult,
    pub degradation: Degradation,
}

impl Evaluation {
    pub fn cardinality(&self) -> f64 {
        self.result.cardinality
    }

    pub fn hash_cost(&self) -> f64 {
        self.result.hash_cost
    }

    pub fn relations(&self) -> RelationSet {
        self.result.relations
    }
}

/// Evaluates join trees under a cost model and fallback policy.
#[derive(Clone)]
pub struct CostEvaluator {
    pub cost_model: Arc<dyn CostModel>,
    pub fallback: FallbackPolicy,
}

impl Default for CostEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(HashJoinCostModel::default()), FallbackPolicy::default())
    }
}

impl CostEvaluator {
    pub fn new(cost_model: Arc<dyn CostModel>, fallback: FallbackPolicy) -> Self {
        Self {
            cost_model,
            fallback,
        }
    }

    /// Parse and evaluate a join-tree expression.
    pub fn evaluate_expression(&self, expr: &str, catalog: &dyn CardinalityCatalog) -> Evaluation {
        self.evaluate(&JoinTree::parse(expr), catalog)
    }

    /// Evaluate a parsed join tree.
    pub fn evaluate(&self, tree: &JoinTree, catalog: &dyn CardinalityCatalog) -> Evaluation {
        let mut degradation = Degradation::default();
        let result = self.evaluate_node(tree, catalog, &mut degradation);
        debug!(
            cardinality = result.cardinality,
            hash_cost = result.hash_cost,
            relations = %result.relations,
            degraded = degradation.total(),
            "Evaluated join tree"
        );
        Evaluation {
            result,
            degradation,
        }
    }

    fn evaluate_node(
        &self,
        tree: &JoinTree,
        catalog: &dyn CardinalityCatalog,
        degradation: &mut Degradation,
    ) -> CostResult {
        match tree {
            JoinTree::Leaf { name } => self.evaluate_leaf(name, catalog, degradation),
            JoinTree::Join { left, right } => {
                let l = self.evaluate_node(left, catalog, degradation);
                let r = self.evaluate_node(right, catalog, degradation);

                let relations = l.relations | r.relations;
                let cardinality = catalog.cardinality(relations).unwrap_or_else(|| {
                    degradation.estimated_joins += 1;
                    (l.cardinality * r.cardinality) * self.fallback.join_selectivity
                });
                let local = self.cost_model.join_cost(l.cardinality, r.cardinality);

                trace!(%relations, cardinality, local_cost = local, "Join");
                CostResult {
                    cardinality,
                    hash_cost: l.hash_cost + r.hash_cost + local,
                    relations,
                }
            }
            JoinTree::Malformed { text } => {
                debug!(fragment = %text, "Malformed join-tree fragment");
                degradation.malformed_nodes += 1;
                CostResult {
                    cardinality: self.fallback.malformed_cardinality,
                    hash_cost: 0.0,
                    relations: RelationSet::EMPTY,
                }
            }
        }
    }

    fn evaluate_leaf(
        &self,
        name: &str,
        catalog: &dyn CardinalityCatalog,
        degradation: &mut Degradation,
    ) -> CostResult {
        let Some(relations) = catalog.relation_index(name).and_then(RelationSet::single) else {
            // Unknown names share bit 0 with the first relation, but never borrow
            // its recorded cardinality.
            trace!(relation = name, "Unknown relation");
            degradation.unknown_relations += 1;
            return CostResult {
                cardinality: self.fallback.leaf_cardinality,
                hash_cost: 0.0,
                relations: RelationSet::from_bits(1),
            };
        };

        let cardinality = catalog.cardinality(relations).unwrap_or_else(|| {
            degradation.missing_leaf_cardinalities += 1;
            self.fallback.leaf_cardinality
        });
        CostResult {
            cardinality,
            hash_cost: 0.0,
            relations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::GroundTruth;

    fn two_relations() -> GroundTruth {
        GroundTruth::new(["A", "B"])
            .unwrap()
            .with_cardinality(1, 100.0)
            .with_cardinality(2, 50.0)
            .with_cardinality(3, 20.0)
    }

    #[test]
    fn test_simple_join() {
        let eval = CostEvaluator::default().evaluate_expression("(A|B)", &two_relations());
        assert_eq!(eval.cardinality(), 20.0);
        assert_eq!(eval.relations().bits(), 3);
        assert_eq!(eval.hash_cost(), 160.0);
        assert!(eval.degradation.is_clean());
    }

    #[test]
    fn test_self_join() {
        let eval = CostEvaluator::default().evaluate_expression("((A|B)|A)", &two_relations());
        assert_eq!(eval.cardinality(), 20.0);
        assert_eq!(eval.relations().bits(), 3);
        assert_eq!(eval.hash_cost(), 284.0);
    }

    #[test]
    fn test_unknown_relation_defaults() {
        let eval = CostEvaluator::default().evaluate_expression("R", &two_relations());
        assert_eq!(
            eval.result,
            CostResult {
                cardinality: 1000.0,
                hash_cost: 0.0,
                relations: RelationSet::from_bits(1),
            }
        );
        assert_eq!(eval.degradation.unknown_relations, 1);
    }

    #[test]
    fn test_malformed_expression() {
        let eval = CostEvaluator::default().evaluate_expression("(A", &two_relations());
        assert_eq!(
            eval.result,
            CostResult {
                cardinality: 1000.0,
                hash_cost: 0.0,
                relations: RelationSet::EMPTY,
            }
        );
        assert_eq!(eval.degradation.malformed_nodes, 1);
    }

    #[test]
    fn test_missing_leaf_cardinality() {
        let truth = GroundTruth::new(["A", "B"]).unwrap().with_cardinality(2, 50.0);
        let eval = CostEvaluator::default().evaluate_expression("A", &truth);
        assert_eq!(eval.cardinality(), 1000.0);
        assert_eq!(eval.relations().bits(), 1);
        assert_eq!(eval.degradation.missing_leaf_cardinalities, 1);
    }

    #[test]
    fn test_missing_join_cardinality_is_estimated() {
        let truth = GroundTruth::new(["A", "B"])
            .unwrap()
            .with_cardinality(1, 100.0)
            .with_cardinality(2, 50.0);
        let eval = CostEvaluator::default().evaluate_expression("(A|B)", &truth);
        assert_eq!(eval.cardinality(), 100.0 * 50.0 * 0.01);
        assert_eq!(eval.hash_cost(), 160.0);
        assert_eq!(eval.degradation.estimated_joins, 1);
    }

    #[test]
    fn test_malformed_child_still_costs_parent() {
        // Right input "(B" is malformed: (1000, 0, empty); union (mask 1) is recorded.
        let eval = CostEvaluator::default().evaluate_expression("(A|(B)", &two_relations());
        assert_eq!(eval.relations().bits(), 1);
        assert_eq!(eval.cardinality(), 100.0);
        assert_eq!(eval.hash_cost(), 1.2 * 100.0 + 1000.0);
        assert_eq!(eval.degradation.malformed_nodes, 1);
    }

    #[test]
    fn test_custom_policy_and_model() {
        let evaluator = CostEvaluator::new(
            Arc::new(HashJoinCostModel {
                build_factor: 1.0,
                probe_factor: 1.0,
            }),
            FallbackPolicy {
                leaf_cardinality: 10.0,
                join_selectivity: 0.5,
                malformed_cardinality: 1.0,
            },
        );
        let truth = GroundTruth::new(["A", "B"]).unwrap();
        let eval = evaluator.evaluate_expression("(A|B)", &truth);
        assert_eq!(eval.cardinality(), 10.0 * 10.0 * 0.5);
        assert_eq!(eval.hash_cost(), 20.0);
        assert_eq!(eval.degradation.missing_leaf_cardinalities, 2);
        assert_eq!(eval.degradation.estimated_joins, 1);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let evaluator = CostEvaluator::default();
        let truth = two_relations();
        let tree = JoinTree::parse("((A|B)|(B|A))");
        assert_eq!(evaluator.evaluate(&tree, &truth), evaluator.evaluate(&tree, &truth));
    }

    #[test]
    fn test_degradation_add_assign() {
        let mut total = Degradation::default();
        total += Degradation {
            malformed_nodes: 1,
            unknown_relations: 2,
            missing_leaf_cardinalities: 0,
            estimated_joins: 3,
        };
        total += Degradation {
            estimated_joins: 1,
            ..Default::default()
        };
        assert_eq!(total.total(), 7);
        assert_eq!(total.estimated_joins, 4);
    }
}
