//! Cart records.
//!
//! The backend enriches each stored cart item with its product and a line
//! total. [`Cart`] is the client's snapshot of that list; it is only ever
//! replaced wholesale, never patched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, Price, ProductId, SessionId, UserId};

/// A stored cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Session identifier that owns this row.
    pub user_session: SessionId,
    /// Set when the row was added by a signed-in user; `None` for guests.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A cart row enriched with its product and the backend-computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_item: CartItem,
    pub product: crate::models::Product,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

/// Snapshot of the backend's view of one session's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Wrap the list returned by the backend.
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Lines in backend order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| &line.cart_item.product_id == product_id)
    }

    /// Total number of units across all lines (badge count).
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| line.cart_item.quantity).sum()
    }

    /// Sum of the backend-supplied line totals.
    ///
    /// Never derived from `price * quantity`; the backend is the authority
    /// on every amount shown here.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::inr(self.lines.iter().map(|line| line.total_price).sum())
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self::new(lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line_json(product: &str, quantity: i64, price: f64, total: f64) -> serde_json::Value {
        serde_json::json!({
            "cart_item": {
                "id": format!("item-{product}"),
                "product_id": product,
                "quantity": quantity,
                "user_session": "session_1_abc",
                "user_id": null
            },
            "product": {
                "id": product,
                "name": "Golden Wheat",
                "description": "High-quality wheat grain",
                "price": price,
                "image_url": "https://images.example/wheat.jpg",
                "state": "punjab",
                "category": "Grains",
                "farmer_name": "Sukhdev Kaur",
                "quantity_available": 5000,
                "unit": "kg"
            },
            "total_price": total
        })
    }

    #[test]
    fn test_decodes_backend_cart() {
        let json = serde_json::json!([line_json("wheat", 2, 25.0, 50.0)]);
        let cart: Cart = serde_json::from_value(json).unwrap();

        assert_eq!(cart.lines().len(), 1);
        let line = cart.line(&ProductId::new("wheat")).unwrap();
        assert_eq!(line.cart_item.quantity, 2);
        assert!(line.cart_item.user_id.is_none());
        assert_eq!(line.total_price, Decimal::new(50, 0));
    }

    #[test]
    fn test_subtotal_uses_backend_line_totals() {
        // A discounted line: the backend total is deliberately not price * quantity.
        let json = serde_json::json!([
            line_json("wheat", 2, 25.0, 45.5),
            line_json("rice", 1, 120.0, 120.0),
        ]);
        let cart: Cart = serde_json::from_value(json).unwrap();

        assert_eq!(cart.subtotal().amount, Decimal::new(1655, 1));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().display(), "₹0.00");
    }
}
