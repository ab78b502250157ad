// src/handlers/brewery.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{CurrentUser, TenantContext},
    models::brewery::BreweryPatch,
    models::user::{Role, User},
};

/// Membership management needs owner or admin rank.
fn require_manager(user: &User) -> Result<(), AppError> {
    match user.role {
        Role::Owner | Role::Admin => Ok(()),
        Role::Member => Err(AppError::Forbidden),
    }
}

pub async fn get_own_brewery(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let brewery = app_state
        .storage
        .get_brewery(&tenant.0)
        .await?
        .ok_or(AppError::NotFound("brewery"))?;
    Ok(Json(brewery))
}

pub async fn update_own_brewery(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(patch): Json<BreweryPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let brewery = app_state
        .storage
        .update_brewery(&tenant.0, patch)
        .await?
        .ok_or(AppError::NotFound("brewery"))?;
    Ok(Json(brewery))
}

/// Deleting the tenant root is owner-only; whether children block the
/// delete or go with it is the backend's configured policy.
pub async fn delete_own_brewery(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    if user.role != Role::Owner {
        return Err(AppError::Forbidden);
    }
    if app_state.storage.delete_brewery(&tenant.0).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("brewery"))
    }
}

pub async fn list_members(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.storage.list_brewery_users(&tenant.0).await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    #[serde(default)]
    pub role: Role,
}

pub async fn add_member(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_manager(&user)?;
    payload.validate()?;

    // Existence is confirmed here; the storage operation treats a missing
    // user or brewery as a programmer error, not a NotFound.
    app_state
        .storage
        .get_user(&payload.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let member = app_state
        .storage
        .add_user_to_brewery(&payload.user_id, &tenant.0, payload.role)
        .await?;
    Ok(Json(member))
}

pub async fn remove_member(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    tenant: TenantContext,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_manager(&user)?;

    let target = app_state
        .storage
        .get_user(&user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if target.brewery_id.as_deref() != Some(tenant.0.as_str()) {
        return Err(AppError::NotFound("user"));
    }

    let removed = app_state.storage.remove_user_from_brewery(&user_id).await?;
    Ok(Json(removed))
}

/// Cross-tenant listing; only reachable behind the auth guard and meant
/// for trusted dashboard tooling.
pub async fn list_breweries(
    State(app_state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let breweries = app_state.storage.list_breweries().await?;
    Ok(Json(breweries))
}
