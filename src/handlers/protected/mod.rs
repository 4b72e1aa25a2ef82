// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind jwt_auth_middleware, which places an AuthUser
// in the request extensions. Ownership checks use AuthUser::uid.

pub mod collections;
pub mod drafts;
pub mod levels;
pub mod profile;
pub mod stats;
pub mod transport;
pub mod users;

use serde::Deserialize;

/// `?query=` parameter of the full-text search endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query: String,
}
