//! User and family handlers. Thin CRUD around the task core.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use super::auth;
use super::routes::{store_error, AppState};
use super::types::*;

/// POST /api/users - register a member. Account/session handling proper
/// is the session layer's job; this just creates the profile row.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<AssigneeProfile>, (StatusCode, String)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name is required".to_string()));
    }
    let user = state.store.create_user(name).await.map_err(store_error)?;
    Ok(Json(user.into()))
}

/// POST /api/families - create a family; the creator becomes its first
/// member and gets the shareable invite code back.
pub async fn create_family(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateFamilyRequest>,
) -> Result<Json<FamilyResponse>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name is required".to_string()));
    }

    let family = state
        .store
        .create_family(name, user.id)
        .await
        .map_err(store_error)?;
    let members = state
        .store
        .family_members(family.id)
        .await
        .map_err(store_error)?;
    tracing::info!(family = %family.id, code = %family.invite_code, "Family created");
    Ok(Json(FamilyResponse::new(family, members)))
}

/// POST /api/families/join - join by invite code (case-insensitive).
pub async fn join_family(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<JoinFamilyRequest>,
) -> Result<Json<FamilyResponse>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    if req.invite_code.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invite code is required".to_string(),
        ));
    }

    let family = state
        .store
        .join_family(&req.invite_code, user.id)
        .await
        .map_err(store_error)?;
    let members = state
        .store
        .family_members(family.id)
        .await
        .map_err(store_error)?;
    Ok(Json(FamilyResponse::new(family, members)))
}

/// GET /api/families/me - the caller's family, members ranked by points.
pub async fn my_family(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<FamilyResponse>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;

    let family = state
        .store
        .get_family(family_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Family not found".to_string()))?;
    let members = state
        .store
        .family_members(family.id)
        .await
        .map_err(store_error)?;
    Ok(Json(FamilyResponse::new(family, members)))
}
