// handlers/protected/profile.rs - GET/PUT /id/profile

use axum::extract::State;
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::database::models::user::{self, ProfileUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /id/profile - the caller's account
pub async fn profile_get(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Value> {
    let user = user::get(&state.db, auth.uid).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PUT /id/profile - change name and/or email
pub async fn profile_put(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<()> {
    user::update_profile(&state.db, auth.uid, &update).await?;
    Ok(ApiResponse::ok())
}
