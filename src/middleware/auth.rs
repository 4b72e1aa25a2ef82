use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

const BEARER: &str = "Bearer";

/// Shortest header value that can possibly carry a token.
const MIN_HEADER_LEN: usize = BEARER.len() + 10;

/// Authenticated caller, set once by [`jwt_auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: i32,
    pub claims: Claims,
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers()).map_err(ApiError::forbidden)?;

    let claims = state.auth.verify(token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::forbidden(e.to_string())
    })?;
    let uid = claims.uid().map_err(|e| ApiError::forbidden(e.to_string()))?;

    request.extensions_mut().insert(AuthUser { uid, claims });

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers.get(AUTHORIZATION).ok_or("missing token")?;
    let auth_str = auth_header.to_str().map_err(|_| "invalid token")?;

    if auth_str.len() < MIN_HEADER_LEN {
        return Err("invalid token");
    }
    let token = auth_str.strip_prefix(BEARER).ok_or("invalid token")?;
    Ok(token.trim_start())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::forbidden("forbidden"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn short_headers_are_rejected() {
        assert_eq!(extract_jwt_from_headers(&HeaderMap::new()), Err("missing token"));
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc")), Err("invalid token"));
    }

    #[test]
    fn scheme_is_stripped() {
        assert_eq!(
            extract_jwt_from_headers(&headers("Bearer aaaa.bbbb.cccc")),
            Ok("aaaa.bbbb.cccc")
        );
        assert_eq!(extract_jwt_from_headers(&headers("Token aaaa.bbbb.cccc")), Err("invalid token"));
    }
}
