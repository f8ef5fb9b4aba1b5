use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
};

use agro_core::{Entity, ProductId};
use agro_products::{Product, ProductPayload, merge_partial, validate_product};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

fn parse_id(raw: &str) -> Result<ProductId, ApiError> {
    Ok(raw.parse::<ProductId>()?)
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(services.store.list().await?))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let payload = dto::product_payload(body)?;
    let draft = validate_product(&payload)?;

    let product = services.store.insert(draft).await?;
    tracing::info!(product_id = %product.id(), user_id = %principal.user_id(), by = principal.username(), "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn retrieve(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    let product = services.store.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(product))
}

/// Full replacement of the mutable fields (PUT).
pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    if services.store.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let payload = dto::product_payload(body)?;
    let draft = validate_product(&payload)?;

    let product = services.store.update(id, draft).await?.ok_or(ApiError::NotFound)?;
    tracing::info!(product_id = %id, user_id = %principal.user_id(), by = principal.username(), "product updated");

    Ok(Json(product))
}

/// Like [`update`], but omitted fields keep their stored values (PATCH).
pub async fn partial_update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    let existing = services.store.get(id).await?.ok_or(ApiError::NotFound)?;

    let payload = merge_partial(&existing, dto::product_payload(body)?);
    let draft = validate_product(&payload)?;

    let product = services.store.update(id, draft).await?.ok_or(ApiError::NotFound)?;
    tracing::info!(product_id = %id, user_id = %principal.user_id(), by = principal.username(), "product partially updated");

    Ok(Json(product))
}

pub async fn destroy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if !services.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(product_id = %id, user_id = %principal.user_id(), by = principal.username(), "product deleted");

    Ok(StatusCode::NO_CONTENT)
}
