//! HTTP API for the License Engine.
//!
//! This module exposes the cost engine over a small REST API built on
//! [`axum`](https://crates.io/crates/axum).  Clients post the
//! subscription (and, for grouping, employee) records they already
//! hold and receive the derived figures as JSON.  Records are
//! validated before any computation; violations are answered with
//! `422 Unprocessable Entity` and an `{"error": ...}` body.

use crate::config::EngineConfig;
use crate::cost::Dimension;
use crate::engine::CostEngine;
use crate::error::{validate_all, EngineError};
use crate::models::{Employee, Subscription};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across requests.
pub struct AppState {
    pub engine: CostEngine,
}

/// Body of the endpoints that only need subscriptions.
#[derive(Debug, Deserialize)]
pub struct SubscriptionsRequest {
    pub subscriptions: Vec<Subscription>,
}

/// Body of `POST /api/subscriptions/usage`.  Records stay raw JSON so
/// they can be echoed back unchanged.
#[derive(Debug, Deserialize)]
pub struct RecordsRequest {
    pub subscriptions: Vec<Value>,
}

/// Body of `POST /api/costs/grouped`.
#[derive(Debug, Deserialize)]
pub struct GroupedCostRequest {
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    pub dimension: Dimension,
}

/// Validation failure reported to the client.
struct ApiError(EngineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Rejected invalid subscription data");
        let body = Json(serde_json::json!({"error": self.0.to_string()}));
        (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
    }
}

/// Build the API router around an engine configured from `config`.
pub fn build_router(config: &EngineConfig) -> Result<(Router, Arc<AppState>)> {
    let state = Arc::new(AppState {
        engine: CostEngine::new(config)?,
    });
    let router = Router::new()
        .route("/api/subscriptions/metrics", post(metrics_handler))
        .route("/api/subscriptions/usage", post(usage_handler))
        .route("/api/costs/grouped", post(grouped_handler))
        .route("/api/costs/summary", post(summary_handler))
        .with_state(state.clone());
    Ok((router, state))
}

/// Handler for POST /api/subscriptions/metrics
async fn metrics_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<SubscriptionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_all(&input.subscriptions).map_err(ApiError)?;
    Ok(Json(app_state.engine.metrics(&input.subscriptions)))
}

/// Handler for POST /api/subscriptions/usage
async fn usage_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<RecordsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let annotated = app_state
        .engine
        .annotate_usage(&input.subscriptions)
        .map_err(ApiError)?;
    Ok(Json(annotated))
}

/// Handler for POST /api/costs/grouped
async fn grouped_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<GroupedCostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_all(&input.subscriptions).map_err(ApiError)?;
    Ok(Json(app_state.engine.grouped_cost_by(
        &input.subscriptions,
        &input.employees,
        input.dimension,
    )))
}

/// Handler for POST /api/costs/summary
async fn summary_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<SubscriptionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_all(&input.subscriptions).map_err(ApiError)?;
    Ok(Json(app_state.engine.summary(&input.subscriptions)))
}

/// Launch the API server on `addr`.  Runs until the server
/// terminates.
pub async fn serve(addr: &str, config: &EngineConfig) -> Result<()> {
    let (router, _state) = build_router(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
