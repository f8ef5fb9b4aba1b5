use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
};
use chrono::Utc;

use agro_auth::{JwtValidator, TokenPair, authenticate};

use crate::app::dto::{AccessResponse, LoginRequest, RefreshRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::ensure_active_user;

/// `POST /login/` — exchange credentials for an access/refresh pair.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    // An unreadable body is just another failed login.
    let Json(body) = body.map_err(|_| ApiError::InvalidCredentials)?;
    let username = body.username.clone();

    let users = services.users.clone();
    let result = tokio::task::spawn_blocking(move || {
        authenticate(&*users, body.username.as_deref(), body.password.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))?;

    let user = match result {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(username = username.as_deref().unwrap_or(""), "login failed");
            return Err(e.into());
        }
    };

    let pair = services.jwt.issue_pair(&user, Utc::now())?;
    tracing::info!(username = %user.username, "login succeeded");

    Ok(Json(pair))
}

/// `POST /login/refresh/` — trade a refresh token for a new access token.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let token = body
        .refresh
        .ok_or_else(|| ApiError::Validation("field 'refresh' is required".to_string()))?;

    let now = Utc::now();
    let claims = services.jwt.validate(&token, now)?;
    ensure_active_user(services.users.as_ref(), &claims)?;

    let access = services.jwt.refresh_access(&token, now)?;
    Ok(Json(AccessResponse { access }))
}
