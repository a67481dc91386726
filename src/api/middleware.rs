/// Authentication helpers for the dashboard routes
///
/// Credentials are bearer API tokens resolved against the user store; the
/// credential lifecycle itself (issuance, rotation, reset) is handled
/// outside this service.
use crate::{
    context::AppContext,
    db::models::{User, UserRole},
    error::{ApiError, ApiResult},
};
use axum::http::HeaderMap;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(|t| t.to_string()))
}

/// Require authentication - resolve the token or return 401
pub async fn require_auth(ctx: &AppContext, headers: &HeaderMap) -> ApiResult<User> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?;

    ctx.users
        .find_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::Authentication("Invalid token".to_string()))
}

/// Optional authentication - resolve the token when present, without
/// failing anonymous requests
pub async fn optional_auth(ctx: &AppContext, headers: &HeaderMap) -> ApiResult<Option<User>> {
    match extract_bearer_token(headers) {
        Some(token) => ctx.users.find_by_token(&token).await,
        None => Ok(None),
    }
}

/// Whether the user may act on a resource owned by `owner_id`
pub fn can_access(user: &User, owner_id: &str) -> bool {
    user.role == UserRole::Admin || user.id == owner_id
}
