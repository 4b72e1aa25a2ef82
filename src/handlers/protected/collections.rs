// handlers/protected/collections.rs - /collections/*

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::api::{parse_id, ApiJson};
use crate::database::models::collection::{self, CollectionUpdate, NewCollection};
use crate::database::models::collection_levels::{self, CollectionLevel};
use crate::database::models::Required;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::SearchQuery;

/// POST /collections - create a collection
pub async fn collection_create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut new_collection): ApiJson<NewCollection>,
) -> ApiResult<Value> {
    new_collection.uid = auth.uid;
    let id = collection::create(&state.db, &new_collection).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// PUT /collections - rename or re-describe an owned collection
pub async fn collection_update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut update): ApiJson<CollectionUpdate>,
) -> ApiResult<()> {
    update.uid = auth.uid;
    collection::update(&state.db, &update).await?;
    Ok(ApiResponse::ok())
}

/// GET /collections/u/:uid - collections owned by a user
pub async fn collections_by_user(State(state): State<AppState>, Path(uid): Path<String>) -> ApiResult<Value> {
    let uid = parse_id(&uid)?;
    let collections = collection::by_user(&state.db, uid).await?;
    Ok(ApiResponse::success(json!({ "collections": collections })))
}

/// GET /collections/:id - one collection with its owner's name
pub async fn collection_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let found = collection::get(&state.db, id).await?;
    Ok(ApiResponse::success(json!({ "collection": found })))
}

/// GET /collections/query?query= - full-text search over collections
pub async fn collection_query(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> ApiResult<Value> {
    let results = collection::query_fts(&state.db, &search.query).await?;
    Ok(ApiResponse::success(json!({ "results": results })))
}

/// DELETE /collections/:id - delete an owned collection
pub async fn collection_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    collection::delete(&state.db, id, auth.uid).await?;
    Ok(ApiResponse::ok())
}

async fn ensure_owner(state: &AppState, pair: &CollectionLevel, uid: i32) -> Result<(), ApiError> {
    Required::new()
        .number("collectionId", pair.collection_id)
        .number("levelId", pair.level_id)
        .finish()?;
    if !collection::is_owner(&state.db, pair.collection_id, uid).await? {
        return Err(ApiError::forbidden("forbidden"));
    }
    Ok(())
}

/// POST /collections/level - add a level to an owned collection
pub async fn collection_link_level(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(pair): ApiJson<CollectionLevel>,
) -> ApiResult<()> {
    ensure_owner(&state, &pair, auth.uid).await?;
    collection_levels::link(&state.db, pair).await?;
    Ok(ApiResponse::ok())
}

/// DELETE /collections/level - remove a level from an owned collection
pub async fn collection_unlink_level(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(pair): ApiJson<CollectionLevel>,
) -> ApiResult<()> {
    ensure_owner(&state, &pair, auth.uid).await?;
    collection_levels::unlink(&state.db, pair).await?;
    Ok(ApiResponse::ok())
}

/// GET /collections/levels/:id - levels in a collection
pub async fn collection_levels_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let levels = collection_levels::levels(&state.db, id).await?;
    Ok(ApiResponse::success(json!({ "levels": levels })))
}

/// GET /collections/trending - most played recently
pub async fn collections_trending(State(state): State<AppState>) -> ApiResult<Value> {
    let collections = collection::trending(&state.db).await?;
    Ok(ApiResponse::success(json!({ "collections": collections })))
}
