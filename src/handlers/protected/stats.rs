// handlers/protected/stats.rs - /stats/levels/:id/*

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::api::parse_id;
use crate::database::models::stats::{self, StatsFilter};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /stats/levels/:id/starts - game starts per day
pub async fn level_starts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let result = stats::starts(&state.db, id, &filter).await?;
    Ok(ApiResponse::success(json!({ "result": result })))
}

/// GET /stats/levels/:id/completes - finishes per day
pub async fn level_completes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let result = stats::completes(&state.db, id, &filter).await?;
    Ok(ApiResponse::success(json!({ "result": result })))
}

/// GET /stats/levels/:id/avg-time - mean finishing time per day
pub async fn level_avg_time(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let result = stats::avg_time(&state.db, id, &filter).await?;
    Ok(ApiResponse::success(json!({ "result": result })))
}

/// GET /stats/levels/:id/unique-users - distinct finishers per month
pub async fn level_unique_users(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let result = stats::unique_users(&state.db, id, &filter).await?;
    Ok(ApiResponse::success(json!({ "result": result })))
}
