// src/handlers/recipes.rs

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
    models::recipe::{NewRecipe, RecipePatch},
};

pub async fn list_recipes(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let recipes = app_state.storage.list_recipes(Some(&tenant.0)).await?;
    Ok(Json(recipes))
}

pub async fn get_recipe(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = app_state
        .storage
        .get_recipe(id)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    Ok(Json(recipe))
}

pub async fn create_recipe(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewRecipe>,
) -> Result<impl IntoResponse, AppError> {
    // Empty ingredient or instruction lists are rejected here; nothing is
    // persisted for an invalid recipe.
    payload.validate()?;
    let recipe = app_state
        .storage
        .create_recipe(Some(&tenant.0), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update_recipe(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<RecipePatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;
    let recipe = app_state
        .storage
        .update_recipe(id, patch)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.storage.delete_recipe(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("recipe"))
    }
}
