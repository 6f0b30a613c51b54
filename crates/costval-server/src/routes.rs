//! # HTTP Route Handlers
//!
//! ## Wire Protocol
//!
//! - `POST /evaluate` with `EvaluateRequest`: cost one join tree.
//! - `POST /compare` with `CompareRequest`: cost an approximate and an exact tree
//!   against the same ground truth and report the regression.
//!
//! Ground truth travels as the text of the ground-truth file, so the service
//! reads exactly what the batch driver reads from disk.
//!
//! ## Error Handling
//!
//! - 400 Bad Request: the ground truth cannot be parsed (missing name header,
//!   too many relations).
//!
//! Malformed trees, unknown relations and missing cardinalities are not errors;
//! they are absorbed by the fallback policy and reported in `degradation`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use costval_core::compare::compare_plans;
use costval_core::evaluate::{Degradation, Evaluation};
use costval_core::ground_truth::GroundTruth;

use crate::state::AppState;

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Request body for `POST /evaluate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// Ground-truth file contents.
    pub ground_truth: String,
    /// Join-tree expression, e.g. `((A|B)|C)`.
    pub tree: String,
}

/// Cost of one tree.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub cardinality: f64,
    pub hash_cost: f64,
    /// Relation-set bitmask of the root.
    pub relations: u64,
    pub degradation: DegradationResponse,
}

impl From<Evaluation> for EvaluateResponse {
    fn from(eval: Evaluation) -> Self {
        Self {
            cardinality: eval.cardinality(),
            hash_cost: eval.hash_cost(),
            relations: eval.relations().bits(),
            degradation: eval.degradation.into(),
        }
    }
}

/// Fallback counts of one evaluation.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradationResponse {
    pub malformed_nodes: usize,
    pub unknown_relations: usize,
    pub missing_leaf_cardinalities: usize,
    pub estimated_joins: usize,
}

impl From<Degradation> for DegradationResponse {
    fn from(d: Degradation) -> Self {
        Self {
            malformed_nodes: d.malformed_nodes,
            unknown_relations: d.unknown_relations,
            missing_leaf_cardinalities: d.missing_leaf_cardinalities,
            estimated_joins: d.estimated_joins,
        }
    }
}

/// Request body for `POST /compare`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub ground_truth: String,
    /// Tree chosen by the approximate (DPconv) enumerator.
    pub approx_tree: String,
    /// Tree chosen by the exact (DPccp) enumerator.
    pub exact_tree: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub approx: EvaluateResponse,
    pub exact: EvaluateResponse,
    pub diff_percent: f64,
    /// Whether the regression is within the server's threshold.
    pub effective: bool,
}

fn parse_ground_truth(text: &str) -> Result<GroundTruth, (StatusCode, String)> {
    GroundTruth::parse(text)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid ground truth: {}", e)))
}

/// POST /evaluate
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, (StatusCode, String)> {
    let truth = parse_ground_truth(&req.ground_truth)?;
    let eval = state.evaluator.evaluate_expression(&req.tree, &truth);
    Ok(Json(eval.into()))
}

/// POST /compare
pub async fn compare(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, (StatusCode, String)> {
    let truth = parse_ground_truth(&req.ground_truth)?;
    let plans = compare_plans(&state.evaluator, &truth, &req.approx_tree, &req.exact_tree);
    debug!(
        diff_percent = plans.comparison.diff_percent,
        degraded = plans.degradation().total(),
        "Compared plans"
    );

    Ok(Json(CompareResponse {
        approx: plans.approx.into(),
        exact: plans.exact.into(),
        diff_percent: plans.comparison.diff_percent,
        effective: plans.comparison.is_effective(state.config.threshold_percent),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUTH: &str = "h\nA B\n--\n1 100\n2 50\n3 20\n";

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState::new()))
    }

    #[tokio::test]
    async fn test_evaluate() {
        let req = EvaluateRequest {
            ground_truth: TRUTH.to_string(),
            tree: "(A|B)".to_string(),
        };
        let Json(resp) = evaluate(state(), Json(req)).await.unwrap();
        assert_eq!(resp.cardinality, 20.0);
        assert_eq!(resp.hash_cost, 160.0);
        assert_eq!(resp.relations, 3);
        assert_eq!(resp.degradation, DegradationResponse::default());
    }

    #[tokio::test]
    async fn test_evaluate_survives_deep_nesting() {
        let req = EvaluateRequest {
            ground_truth: TRUTH.to_string(),
            tree: format!("{}A{}", "(".repeat(100_000), "|B)".repeat(100_000)),
        };
        let Json(resp) = evaluate(state(), Json(req)).await.unwrap();
        assert_eq!(resp.degradation.malformed_nodes, 1);
        assert_eq!(resp.relations, 2);
    }

    #[tokio::test]
    async fn test_response_wire_names() {
        let req = EvaluateRequest {
            ground_truth: TRUTH.to_string(),
            tree: "(A|C)".to_string(),
        };
        let Json(resp) = evaluate(state(), Json(req)).await.unwrap();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["relations"], 1);
        assert!(json.get("hashCost").is_some());
        assert_eq!(json["degradation"]["unknownRelations"], 1);
        assert_eq!(json["degradation"]["missingLeafCardinalities"], 0);
        assert!(json["degradation"].get("unknown_relations").is_none());
    }

    #[tokio::test]
    async fn test_evaluate_rejects_bad_ground_truth() {
        let req = EvaluateRequest {
            ground_truth: "no names".to_string(),
            tree: "(A|B)".to_string(),
        };
        let (status, _) = evaluate(state(), Json(req)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare() {
        let req = CompareRequest {
            ground_truth: TRUTH.to_string(),
            approx_tree: "((A|B)|A)".to_string(),
            exact_tree: "(A|B)".to_string(),
        };
        let Json(resp) = compare(state(), Json(req)).await.unwrap();
        assert_eq!(resp.approx.hash_cost, 284.0);
        assert_eq!(resp.exact.hash_cost, 160.0);
        assert!((resp.diff_percent - 77.5).abs() < 1e-9);
        assert!(!resp.effective);
    }

    #[tokio::test]
    async fn test_compare_reports_degradation() {
        let req = CompareRequest {
            ground_truth: TRUTH.to_string(),
            approx_tree: "(A|(B".to_string(),
            exact_tree: "(A|C)".to_string(),
        };
        let Json(resp) = compare(state(), Json(req)).await.unwrap();
        assert_eq!(resp.approx.degradation.malformed_nodes, 1);
        assert_eq!(resp.exact.degradation.unknown_relations, 1);
    }

    #[test]
    fn test_request_wire_names() {
        let req: CompareRequest = serde_json::from_str(
            r#"{"groundTruth": "h\nA\n", "approxTree": "A", "exactTree": "A"}"#,
        )
        .unwrap();
        assert_eq!(req.approx_tree, "A");
    }
}
