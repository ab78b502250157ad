// src/handlers/price_history.rs

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
    models::price_history::{NewPriceHistoryEntry, PriceHistoryPatch},
};

pub async fn list_entries(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.storage.list_price_history(Some(&tenant.0)).await?;
    Ok(Json(entries))
}

pub async fn list_for_ingredient(
    State(app_state): State<AppState>,
    Path(ingredient_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state
        .storage
        .list_price_history_for_ingredient(ingredient_id)
        .await?;
    Ok(Json(entries))
}

pub async fn create_entry(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewPriceHistoryEntry>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    // The ingredient reference is resolved within the caller's brewery by
    // the storage layer; a miss comes back as a conflict.
    let entry = app_state
        .storage
        .create_price_history_entry(Some(&tenant.0), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<PriceHistoryPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let entry = app_state
        .storage
        .update_price_history_entry(id, patch)
        .await?
        .ok_or(AppError::NotFound("price history entry"))?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.storage.delete_price_history_entry(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("price history entry"))
    }
}
