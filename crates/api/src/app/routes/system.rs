use axum::http::StatusCode;

/// Liveness probe; no auth, no collaborators touched.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
