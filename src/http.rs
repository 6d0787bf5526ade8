use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::error::DashboardError;
use crate::models::JobFairStats;
use crate::range::{self, DateWindow};

pub struct AppState {
    pub pool: PgPool,
    pub defaults: DateWindow,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/jobfair", get(jobfair_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health: liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/jobfair?startDate=..&endDate=..
pub async fn jobfair_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<JobFairStats>, DashboardError> {
    let range = range::resolve(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        &state.defaults,
    )?;
    let stats = db::fetch_stats(&state.pool, &range).await?;
    Ok(Json(stats))
}
