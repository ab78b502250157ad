// src/handlers/sources.rs

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
    models::source::{IngredientSourcePatch, NewIngredientSource},
};

pub async fn list_sources(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let sources = app_state
        .storage
        .list_ingredient_sources(Some(&tenant.0))
        .await?;
    Ok(Json(sources))
}

pub async fn get_source(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let source = app_state
        .storage
        .get_ingredient_source(id)
        .await?
        .ok_or(AppError::NotFound("ingredient source"))?;
    Ok(Json(source))
}

pub async fn create_source(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewIngredientSource>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let source = app_state
        .storage
        .create_ingredient_source(Some(&tenant.0), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(source)))
}

pub async fn update_source(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<IngredientSourcePatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let source = app_state
        .storage
        .update_ingredient_source(id, patch)
        .await?
        .ok_or(AppError::NotFound("ingredient source"))?;
    Ok(Json(source))
}

pub async fn delete_source(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.storage.delete_ingredient_source(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("ingredient source"))
    }
}
