// handlers/protected/levels.rs - /levels/*

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{parse_id, ApiJson};
use crate::database::models::event::Event;
use crate::database::models::level::{self, LevelUpdate, NewLevel};
use crate::database::models::{draft, leaderboard, Required};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{LevelService, PublishDraft};
use crate::state::AppState;

use super::SearchQuery;

/// POST /levels - create a level with its course data
pub async fn level_create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut new_level): ApiJson<NewLevel>,
) -> ApiResult<Value> {
    new_level.uid = auth.uid;
    let id = level::create(&state.db, &new_level).await?;

    state.tracker.fire(Event::new("level_create").uid(auth.uid).level(id));
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// POST /levels/fromDraft - publish a draft as a new level
pub async fn level_create_from_draft(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(params): ApiJson<PublishDraft>,
) -> ApiResult<Value> {
    let id = LevelService::new(state.db.clone())
        .publish_draft(auth.uid, &params)
        .await?;

    state.tracker.fire(
        Event::new("level_create")
            .uid(auth.uid)
            .level(id)
            .draft(params.draft_id),
    );
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// GET /levels/:id - level with course data
pub async fn level_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let level = level::get(&state.db, id).await?;
    Ok(ApiResponse::success(json!({ "level": level })))
}

/// GET /levels/info/:id - level metadata only
pub async fn level_info(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let level = level::get_info(&state.db, id).await?;
    Ok(ApiResponse::success(json!({ "level": level })))
}

/// GET /levels/u/:uid - levels owned by a user
pub async fn levels_by_user(State(state): State<AppState>, Path(uid): Path<String>) -> ApiResult<Value> {
    let uid = parse_id(&uid)?;
    let levels = level::by_user(&state.db, uid).await?;
    Ok(ApiResponse::success(json!({ "levels": levels })))
}

/// PUT /levels - partial update of an owned level
pub async fn level_update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut update): ApiJson<LevelUpdate>,
) -> ApiResult<()> {
    update.uid = auth.uid;
    level::update(&state.db, &update).await?;

    state.tracker.fire(Event::new("level_update").uid(auth.uid).level(update.id));
    Ok(ApiResponse::ok())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateFromDraft {
    pub level_id: i32,
    pub draft_id: i32,
}

/// PUT /levels/fromDraft - overwrite a level with the owner's draft of it
pub async fn level_update_from_draft(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(params): ApiJson<UpdateFromDraft>,
) -> ApiResult<()> {
    Required::new()
        .number("levelId", params.level_id)
        .number("draftId", params.draft_id)
        .finish()?;
    let level_id = params.level_id;

    let source = draft::get(&state.db, params.draft_id).await?;
    if source.level_id != Some(level_id) || source.uid != auth.uid {
        return Err(ApiError::bad_request("invalid draft"));
    }
    level::update_from_draft(&state.db, level_id, &source).await?;

    state.tracker.fire(Event::new("level_update").uid(auth.uid).level(level_id));
    Ok(ApiResponse::ok())
}

/// DELETE /levels/:id - not implemented
pub async fn level_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id)?;
    level::delete(&state.db, id).await?;
    Ok(ApiResponse::ok())
}

/// GET /levels/query?query= - full-text search over levels
pub async fn level_query(State(state): State<AppState>, Query(search): Query<SearchQuery>) -> ApiResult<Value> {
    let results = level::query_fts(&state.db, &search.query).await?;
    Ok(ApiResponse::success(json!({ "results": results })))
}

/// GET /levels/trending - most played recently
pub async fn levels_trending(State(state): State<AppState>) -> ApiResult<Value> {
    let levels = level::trending(&state.db).await?;
    Ok(ApiResponse::success(json!({ "levels": levels })))
}

/// GET /levels/leaderboard/:id - best times for a level
pub async fn level_leaderboard(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let result = leaderboard::for_level(&state.db, id).await?;
    Ok(ApiResponse::success(json!({ "result": result })))
}
