//! # costval-server: HTTP Service for Join-Tree Cost Evaluation
//!
//! This binary exposes the cost evaluator as a network service, so an optimizer
//! under test can submit the trees it produced together with the ground truth of
//! the query and get their costs and the regression back.
//!
//! ## Endpoints
//!
//! - `GET  /health`    - Health check
//! - `POST /evaluate`  - Cost one join tree against ground truth
//! - `POST /compare`   - Compare an approximate and an exact join tree
//!
//! ## Configuration
//!
//! The server listens on `COSTVAL_ADDR` (default `0.0.0.0:3000`). Logging is
//! controlled by the `RUST_LOG` environment variable (defaults to `costval=debug`).

mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

fn app(state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/evaluate", post(routes::evaluate))
        .route("/compare", post(routes::compare))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("costval=debug".parse()?))
        .init();

    let state = Arc::new(state::AppState::new());
    let addr = std::env::var("COSTVAL_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("costval-server listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
