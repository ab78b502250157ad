// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{session::SessionRecord, user::User},
    storage::Storage,
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "taproom_sid";

/// What we keep inside the opaque session payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user_id: String,
    pub brewery_id: Option<String>,
}

/// The authenticated user, resolved fresh from storage on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The caller's verified tenant id. Tenant-scoped writes take the brewery
/// id from here, never from the request body.
#[derive(Debug, Clone)]
pub struct TenantContext(pub String);

/// Resolves the session cookie to a user and injects CurrentUser (and
/// TenantContext, when the user belongs to a brewery) into the request.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let sid = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::InvalidSession)?;

    let record = app_state
        .storage
        .get_session(&sid)
        .await?
        .ok_or(AppError::InvalidSession)?;

    if record.expire <= Utc::now() {
        // Stale row; drop it eagerly rather than waiting for the sweeper.
        app_state.storage.delete_session(&sid).await?;
        return Err(AppError::InvalidSession);
    }

    let payload: SessionPayload =
        serde_json::from_value(record.sess).map_err(|_| AppError::InvalidSession)?;

    let user = app_state
        .storage
        .get_user(&payload.user_id)
        .await?
        .ok_or(AppError::InvalidSession)?;

    // The brewery reference on the user record is authoritative; the copy
    // in the session payload is informational and may lag a join/leave.
    if let Some(brewery_id) = user.brewery_id.clone() {
        request.extensions_mut().insert(TenantContext(brewery_id));
    }
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::InvalidSession)
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or(AppError::NoBrewery)
    }
}

/// Opens a server-side session for the user and returns the cookie to set.
pub async fn open_session(
    storage: &dyn Storage,
    ttl: chrono::Duration,
    user: &User,
) -> Result<Cookie<'static>, AppError> {
    let sid = Uuid::new_v4().to_string();
    let payload = SessionPayload {
        user_id: user.id.clone(),
        brewery_id: user.brewery_id.clone(),
    };
    let record = SessionRecord {
        sid: sid.clone(),
        sess: serde_json::to_value(&payload)
            .map_err(|e| anyhow::anyhow!("serializing session payload: {e}"))?,
        expire: Utc::now() + ttl,
    };
    storage.put_session(record).await?;

    let cookie = Cookie::build((SESSION_COOKIE, sid))
        .path("/")
        .http_only(true)
        .build();
    Ok(cookie)
}
