// handlers/protected/users.rs - public profiles and user search

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::api::parse_id;
use crate::database::models::user;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::SearchQuery;

/// GET /u/:id - another user's public profile
pub async fn user_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let user = user::get(&state.db, id).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// GET /u/query?query= - full-text search over users
pub async fn user_query(State(state): State<AppState>, Query(search): Query<SearchQuery>) -> ApiResult<Value> {
    let results = user::query_fts(&state.db, &search.query).await?;
    Ok(ApiResponse::success(json!({ "results": results })))
}
