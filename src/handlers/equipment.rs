// src/handlers/equipment.rs

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
    models::equipment::{EquipmentPatch, NewEquipment},
};

pub async fn list_equipment(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let equipment = app_state.storage.list_equipment(Some(&tenant.0)).await?;
    Ok(Json(equipment))
}

pub async fn get_equipment(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let equipment = app_state
        .storage
        .get_equipment(id)
        .await?
        .ok_or(AppError::NotFound("equipment"))?;
    Ok(Json(equipment))
}

pub async fn create_equipment(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewEquipment>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let equipment = app_state
        .storage
        .create_equipment(Some(&tenant.0), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

pub async fn update_equipment(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<EquipmentPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let equipment = app_state
        .storage
        .update_equipment(id, patch)
        .await?
        .ok_or(AppError::NotFound("equipment"))?;
    Ok(Json(equipment))
}

pub async fn delete_equipment(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.storage.delete_equipment(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("equipment"))
    }
}
