//! # Application State
//!
//! Shared state available to all HTTP request handlers. It is created once at
//! server startup and shared via `Arc` across all concurrent requests.
//!
//! Ground truth is not part of the state: every request carries its own, so
//! requests share nothing mutable and are evaluated independently.

use costval_core::compare::DEFAULT_THRESHOLD_PERCENT;
use costval_core::evaluate::CostEvaluator;

/// Server-level validation settings.
pub struct ServerConfig {
    /// Regression percentage up to which an approximate plan counts as effective.
    pub threshold_percent: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

/// Shared application state, accessible by all request handlers via Axum's State extractor.
pub struct AppState {
    /// Evaluator with the default hash-join cost model and fallback policy.
    pub evaluator: CostEvaluator,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            evaluator: CostEvaluator::default(),
            config: ServerConfig::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
