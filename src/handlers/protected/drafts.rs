// handlers/protected/drafts.rs - /drafts/*

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::api::{parse_id, ApiJson};
use crate::database::models::draft::{self, DraftUpdate, NewDraft};
use crate::database::models::event::Event;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::DraftService;
use crate::state::AppState;

/// POST /drafts - start a new draft
pub async fn draft_create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut new_draft): ApiJson<NewDraft>,
) -> ApiResult<Value> {
    new_draft.uid = auth.uid;
    let id = draft::create(&state.db, &new_draft).await?;

    let mut event = Event::new("draft_create").uid(auth.uid).draft(id);
    if let Some(level_id) = new_draft.level_id {
        event = event.level(level_id);
    }
    state.tracker.fire(event);
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// PUT /drafts - partial update of an owned draft
pub async fn draft_update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut update): ApiJson<DraftUpdate>,
) -> ApiResult<()> {
    update.uid = auth.uid;
    draft::update(&state.db, &update).await?;

    state.tracker.fire(Event::new("draft_update").uid(auth.uid).draft(update.id));
    Ok(ApiResponse::ok())
}

/// GET /drafts/:id - an owned draft
pub async fn draft_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let found = draft::get(&state.db, id).await?;
    if found.uid != auth.uid {
        return Err(ApiError::forbidden("forbidden"));
    }
    Ok(ApiResponse::success(json!({ "draft": found })))
}

/// GET /drafts/level/:id - the caller's draft of a level, forking it if needed
pub async fn draft_for_level(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(level_id): Path<String>,
) -> ApiResult<Value> {
    let level_id = parse_id(&level_id)?;
    let service = DraftService::new(state.db.clone(), state.content.fork_name_prefix.clone());
    let found = service.level_draft(&state.tracker, level_id, auth.uid).await?;
    Ok(ApiResponse::success(json!({ "draft": found })))
}

/// GET /drafts/u - the caller's drafts
pub async fn drafts_mine(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Value> {
    let drafts = draft::by_user(&state.db, auth.uid).await?;
    Ok(ApiResponse::success(json!({ "drafts": drafts })))
}

/// DELETE /drafts/:id - delete an owned draft
pub async fn draft_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    draft::delete_owned(&state.db, id, auth.uid).await?;

    state.tracker.fire(Event::new("draft_delete").uid(auth.uid).draft(id));
    Ok(ApiResponse::ok())
}
