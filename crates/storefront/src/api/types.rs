//! Request and response envelopes for the marketplace REST API.
//!
//! Records the backend owns live in `agrimap_core`; only the shapes that
//! exist purely on the wire are defined here.

use serde::{Deserialize, Serialize};

use agrimap_core::{PaymentSessionId, ProductId, SessionId, User};

/// Body of `POST /api/cart/add`.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCartRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: i64,
    pub user_session: &'a SessionId,
}

/// Body of `POST /api/checkout/create-session`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckoutRequest<'a> {
    pub origin_url: &'a str,
    pub user_session: &'a SessionId,
}

/// Response of `POST /api/checkout/create-session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    /// Hosted payment page the browser is sent to.
    pub url: String,
    /// Payment session to poll after the provider redirects back.
    pub session_id: PaymentSessionId,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub session_id: &'a str,
}

/// Response of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    /// Bearer token for later requests, when the backend issues one.
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Product list filter for `GET /api/products`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    /// State slug, e.g. `kerala`. The backend lowercases it.
    pub state: Option<String>,
    /// Exact category name, e.g. `Spices`.
    pub category: Option<String>,
}

impl ProductFilter {
    /// Products from one state.
    #[must_use]
    pub fn state(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            category: None,
        }
    }

    /// Narrow the filter to one category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Human-readable detail; validation errors arrive as a list.
    pub(crate) fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
