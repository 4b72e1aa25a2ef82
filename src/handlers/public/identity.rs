// handlers/public/identity.rs - POST /id/register and POST /id/login

use axum::extract::State;
use serde_json::json;
use tracing::{error, info};

use crate::api::ApiJson;
use crate::database::models::event::Event;
use crate::database::models::user::{self, Credentials, Registration};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /id/register - create an account
///
/// Body: `{"email", "password", "name"}`, all required.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> ApiResult<()> {
    let id = user::register(&state.db, &registration).await?;
    info!(uid = id, "Registered user");

    state.tracker.fire(Event::new("user_register").uid(id));
    Ok(ApiResponse::ok())
}

/// POST /id/login - exchange credentials for a session token
///
/// Responds with `{"status", "token", "user"}`.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<serde_json::Value> {
    let mut account = user::authenticate(&state.db, &credentials).await?;

    let token = state.auth.issue(account.id).map_err(|e| {
        error!("Could not issue token: {}", e);
        ApiError::internal_server_error("could not issue token")
    })?;
    user::record_login(&state.db, &mut account).await;

    state.tracker.fire(Event::new("user_login").uid(account.id));
    Ok(ApiResponse::success(json!({
        "token": token,
        "user": account.to_user_data(),
    })))
}
