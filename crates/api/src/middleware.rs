//! Request pipeline stages.
//!
//! Outermost to innermost: request log → auth → cache invalidation (writes)
//! → cache lookup (list) → handler. Wiring lives in [`crate::app`].

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use agro_auth::{JwtValidator, TokenClaims, UserDirectory};
use agro_infra::CachedResponse;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Lifetime of a cached list response.
pub const LIST_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub users: Arc<dyn UserDirectory>,
}

/// Reject requests without a valid access token; attach the caller otherwise.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .jwt
        .validate_access(token, Utc::now())
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    ensure_active_user(state.users.as_ref(), &claims)?;

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.username));

    Ok(next.run(req).await)
}

/// The token's subject must still exist (same id) and be active.
pub fn ensure_active_user(users: &dyn UserDirectory, claims: &TokenClaims) -> Result<(), ApiError> {
    match users.find_by_username(&claims.username) {
        Some(user) if user.id == claims.sub && user.is_active() => Ok(()),
        _ => Err(ApiError::Unauthorized("user not found or inactive".into())),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::Unauthorized("authentication credentials were not provided".into());

    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(missing)?;

    let header = header.to_str().map_err(|_| missing())?;

    let header = header.strip_prefix("Bearer ").ok_or_else(missing)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(missing());
    }

    Ok(token)
}

/// Serve list responses from the cache; store 200 responses on a miss.
///
/// Keyed by method + path + query. A hit never reaches the handler.
pub async fn cache_lookup(
    State(services): State<Arc<AppServices>>,
    req: Request,
    next: Next,
) -> Response {
    let key = cache_key(&req);

    match services.cache.get(&key).await {
        Ok(Some(hit)) => {
            tracing::debug!(%key, "response cache hit");
            return replay(hit);
        }
        Ok(None) => {}
        Err(e) => return ApiError::from(e).into_response(),
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => return ApiError::Internal(format!("failed to buffer response: {e}")).into_response(),
    };

    let entry = CachedResponse {
        status: parts.status.as_u16(),
        content_type: parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: bytes.to_vec(),
    };
    if let Err(e) = services.cache.set(&key, entry, LIST_CACHE_TTL).await {
        return ApiError::from(e).into_response();
    }

    parts.headers.insert(header::CACHE_CONTROL, max_age());
    Response::from_parts(parts, Body::from(bytes))
}

fn cache_key(req: &Request) -> String {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());
    format!("{} {}", req.method(), target)
}

fn replay(hit: CachedResponse) -> Response {
    let status = StatusCode::from_u16(hit.status).unwrap_or(StatusCode::OK);
    let mut response = (status, hit.body).into_response();
    let headers = response.headers_mut();
    headers.remove(header::CONTENT_TYPE);
    if let Some(value) = hit.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CACHE_CONTROL, max_age());
    response
}

fn max_age() -> HeaderValue {
    HeaderValue::from_static("max-age=600")
}

/// Flush the whole response cache after every successful write.
///
/// Runs after the handler has persisted its change and before the response
/// leaves the pipeline.
pub async fn invalidate_on_write(
    State(services): State<Arc<AppServices>>,
    req: Request,
    next: Next,
) -> Response {
    let is_write = matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );

    let response = next.run(req).await;

    if is_write && response.status().is_success() {
        if let Err(e) = services.cache.clear().await {
            return ApiError::from(e).into_response();
        }
        tracing::debug!("response cache flushed");
    }

    response
}

/// Record method, path and status of every request.
pub async fn request_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    tracing::info!(method = %method, path = %path, status, "{method} {path} -> {status}");

    response
}
