// src/handlers/schedules.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::TenantContext,
    models::schedule::{BrewingSchedulePatch, NewBrewingSchedule},
};

pub async fn list_schedules(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let schedules = app_state
        .storage
        .list_brewing_schedules(Some(&tenant.0))
        .await?;
    Ok(Json(schedules))
}

pub async fn get_schedule(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state
        .storage
        .get_brewing_schedule(id)
        .await?
        .ok_or(AppError::NotFound("brewing schedule"))?;
    Ok(Json(schedule))
}

pub async fn create_schedule(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewBrewingSchedule>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    // Recipe/equipment references are resolved against the caller's own
    // brewery inside the storage layer.
    let schedule = app_state
        .storage
        .create_brewing_schedule(Some(&tenant.0), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update_schedule(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<BrewingSchedulePatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let schedule = app_state
        .storage
        .update_brewing_schedule(id, patch)
        .await?
        .ok_or(AppError::NotFound("brewing schedule"))?;
    Ok(Json(schedule))
}

pub async fn delete_schedule(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.storage.delete_brewing_schedule(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("brewing schedule"))
    }
}
