use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use agro_products::ProductPayload;

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

/// Unwrap a product body; any JSON rejection (syntax, types, content type)
/// is a validation failure.
pub fn product_payload(body: Result<Json<ProductPayload>, JsonRejection>) -> Result<ProductPayload, ApiError> {
    body.map(|Json(p)| p)
        .map_err(|e| ApiError::Validation(e.body_text()))
}
