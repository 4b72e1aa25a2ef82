// handlers/protected/transport.rs - POST /t telemetry ingestion

use axum::extract::State;

use crate::api::ApiJson;
use crate::database::models::event::Event;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// POST /t - record a client event
///
/// Body: `{"eventType", "levelId"?, "draftId"?, "time"?, "body"?, "state"?}`.
/// The uid always comes from the token.
pub async fn event_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(mut event): ApiJson<Event>,
) -> ApiResult<()> {
    event.uid = Some(auth.uid);
    state.tracker.send(&event).await?;
    Ok(ApiResponse::ok())
}
