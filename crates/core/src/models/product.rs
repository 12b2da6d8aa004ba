//! Catalog product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A product listed by a farmer.
///
/// Immutable from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
    /// Slug of the Indian state the product comes from (e.g. `kerala`).
    pub state: String,
    pub category: String,
    pub farmer_name: String,
    pub quantity_available: u32,
    /// Selling unit (`kg`, `liters`, `pieces`, ...).
    pub unit: String,
}

impl Product {
    /// Unit price with currency, for display.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::inr(self.price)
    }
}
