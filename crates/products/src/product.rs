use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use agro_core::{Entity, ProductId};

/// A persisted catalog entry.
///
/// Only stores construct this (they own id assignment), always from a
/// validated [`ProductDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Decimal,
}

impl Product {
    pub fn new(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
        }
    }

    /// Rehydrate a record read back from a store.
    ///
    /// Skips validation: the row was validated before it was written.
    pub fn restore(id: ProductId, name: String, price: Decimal) -> Self {
        Self { id, name, price }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price with exactly two decimal places.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Current mutable fields, as a draft (used to fill partial updates).
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            price: self.price,
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Validated mutable fields of a product.
///
/// The only way to obtain one outside tests is [`crate::validate_product`],
/// so a draft always satisfies: non-empty name, non-negative price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub(crate) name: String,
    pub(crate) price: Decimal,
}

impl ProductDraft {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// Raw client payload for create/update.
///
/// Every field is optional here; presence rules live in the validator.
/// `price` accepts a JSON number or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}
