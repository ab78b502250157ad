// src/handlers/inventory.rs

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
    models::inventory::{InventoryItemPatch, NewInventoryItem},
};

pub async fn list_items(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .storage
        .list_inventory_items(Some(&tenant.0))
        .await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state
        .storage
        .get_inventory_item(id)
        .await?
        .ok_or(AppError::NotFound("inventory item"))?;
    Ok(Json(item))
}

pub async fn create_item(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewInventoryItem>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    // The tenant id comes from the verified session context, never from
    // the request body.
    let item = app_state
        .storage
        .create_inventory_item(Some(&tenant.0), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<InventoryItemPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let item = app_state
        .storage
        .update_inventory_item(id, patch)
        .await?
        .ok_or(AppError::NotFound("inventory item"))?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.storage.delete_inventory_item(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("inventory item"))
    }
}
