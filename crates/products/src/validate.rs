//! Payload validation rules.
//!
//! Two business rules (name present, price present and non-negative) plus the
//! column shape of the `products` table (`VARCHAR(100)`, `NUMERIC(10,2)`).

use rust_decimal::Decimal;

use agro_core::{DomainError, DomainResult};

use crate::product::{Product, ProductDraft, ProductPayload};

/// Maximum length of a product name, in characters.
pub const MAX_NAME_LEN: usize = 100;

const DECIMAL_PLACES: u32 = 2;
const MAX_DIGITS: u32 = 10;

/// Check a candidate payload and turn it into a [`ProductDraft`].
///
/// The name is trimmed before it is checked and stored. Zero is a valid price.
pub fn validate_product(payload: &ProductPayload) -> DomainResult<ProductDraft> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(DomainError::validation("field 'name' is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "field 'name' must have at most {MAX_NAME_LEN} characters"
        )));
    }

    let price = payload
        .price
        .ok_or_else(|| DomainError::validation("field 'price' is required"))?;
    if price < Decimal::ZERO {
        return Err(DomainError::validation(
            "field 'price' must be greater than or equal to zero",
        ));
    }

    Ok(ProductDraft {
        name: name.to_string(),
        price: fit_price(price)?,
    })
}

/// Fill fields omitted from a partial update with the record's current values.
pub fn merge_partial(existing: &Product, payload: ProductPayload) -> ProductPayload {
    ProductPayload {
        name: payload.name.or_else(|| Some(existing.name().to_string())),
        price: payload.price.or(Some(existing.price())),
    }
}

fn fit_price(price: Decimal) -> DomainResult<Decimal> {
    if price.normalize().scale() > DECIMAL_PLACES {
        return Err(DomainError::validation(format!(
            "field 'price' must have no more than {DECIMAL_PLACES} decimal places"
        )));
    }

    let mut scaled = price;
    scaled.rescale(DECIMAL_PLACES);

    let limit = Decimal::from(10_i64.pow(MAX_DIGITS - DECIMAL_PLACES));
    if scaled >= limit {
        return Err(DomainError::validation(format!(
            "field 'price' must have no more than {MAX_DIGITS} digits in total"
        )));
    }

    Ok(scaled)
}
