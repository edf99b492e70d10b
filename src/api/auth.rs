//! Caller identification.
//!
//! The session protocol itself lives outside this service; handlers
//! identify the caller from an `x-user-id` header that the session layer
//! injects. Task endpoints additionally require family membership, since
//! every task query is family-scoped.

use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use super::routes::AppState;
use crate::family::User;

pub const USER_HEADER: &str = "x-user-id";

/// Resolve the calling user or fail with 401.
pub async fn current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<User, (StatusCode, String)> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, "Not authenticated".to_string());

    let raw = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(unauthorized)?;
    let id = Uuid::parse_str(raw).map_err(|_| unauthorized())?;
    state
        .store
        .get_user(id)
        .await
        .map_err(super::routes::store_error)?
        .ok_or_else(unauthorized)
}

/// The caller's family id, or 400 if they have not joined one yet.
pub fn require_family(user: &User) -> Result<Uuid, (StatusCode, String)> {
    user.family_id.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "You must join a family first".to_string(),
        )
    })
}

/// Check the cron bearer secret on the reminder trigger endpoint.
pub fn check_cron_secret(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, String)> {
    let expected = format!("Bearer {}", state.config.cron_secret);
    let presented = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if presented != expected {
        return Err((StatusCode::UNAUTHORIZED, "Not authorized".to_string()));
    }
    Ok(())
}
