// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{open_session, CurrentUser, SESSION_COOKIE},
    models::brewery::NewBrewery,
    models::user::{NewUser, Role},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupUserPayload {
    #[validate(length(min = 3, message = "username must have at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName is required"))]
    pub last_name: String,
}

/// Signup carries both halves: the brewery account and its first user.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupPayload {
    #[validate(nested)]
    pub user: SignupUserPayload,
    #[validate(nested)]
    pub brewery: NewBrewery,
}

/// Creates a brewery account and its owner in one transactional boundary,
/// then opens a session for the new user.
pub async fn signup(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Uniqueness pre-checks so a duplicate reads as a precise conflict.
    // The storage layer re-checks inside the signup boundary.
    if app_state
        .storage
        .get_user_by_username(&payload.user.username)
        .await?
        .is_some()
    {
        return Err(AppError::UsernameAlreadyExists);
    }
    if app_state
        .storage
        .get_user_by_email(&payload.user.email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailAlreadyExists);
    }

    // Hashing is CPU-bound; keep it off the async workers.
    let password = payload.user.password.clone();
    let hashed_password =
        tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("hashing task failed: {e}"))??;

    let new_user = NewUser {
        username: payload.user.username,
        email: payload.user.email,
        password: hashed_password,
        first_name: payload.user.first_name,
        last_name: payload.user.last_name,
        role: Role::Owner,
        profile_image_url: None,
    };

    let (brewery, user) = app_state
        .storage
        .create_brewery_with_owner(payload.brewery, new_user)
        .await?;

    let cookie = open_session(&*app_state.storage, app_state.session_ttl, &user).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(json!({
            "message": "Account created successfully",
            "user": user,
            "brewery": brewery,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let password = payload.password;
    let password_hash = user.password.clone();
    let password_valid =
        tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))??;

    if !password_valid {
        return Err(AppError::InvalidCredentials);
    }

    let brewery = match &user.brewery_id {
        Some(id) => app_state.storage.get_brewery(id).await?,
        None => None,
    };

    let cookie = open_session(&*app_state.storage, app_state.session_ttl, &user).await?;

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "user": user,
            "brewery": brewery,
        })),
    ))
}

/// Destroys the server-side session if one exists and clears the cookie.
/// Deliberately tolerant: logging out with a stale cookie still succeeds.
pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        app_state.storage.delete_session(cookie.value()).await?;
    }
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    Ok((
        jar.remove(removal),
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

/// Who am I: the session's user plus their brewery, if any.
pub async fn me(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let brewery = match &user.brewery_id {
        Some(id) => app_state.storage.get_brewery(id).await?,
        None => None,
    };
    Ok(Json(json!({ "user": user, "brewery": brewery })))
}
