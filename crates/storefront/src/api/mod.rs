//! Marketplace REST API client.
//!
//! # Architecture
//!
//! - [`StorefrontApi`] is the seam every flow (cart, checkout, payment
//!   polling, auth) is written against
//! - [`BackendClient`] implements it over `reqwest`, with a cookie jar for the
//!   backend's session cookie and an optional bearer token
//! - The backend is the source of truth: no local persistence, no retries
//!
//! # Example
//!
//! ```rust,ignore
//! use agrimap_storefront::api::{BackendClient, StorefrontApi};
//!
//! let client = BackendClient::new(&config)?;
//! let session = SessionId::generate();
//!
//! client.add_to_cart(&session, &product_id, 2).await?;
//! let lines = client.cart(&session).await?;
//! ```

mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use std::collections::BTreeMap;
use std::future::Future;

use thiserror::Error;

use agrimap_core::{
    CartItem, CartLine, PaymentSession, PaymentSessionId, Product, ProductId, SessionId,
    StateInfo, User,
};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Backend rejected the credentials (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status reported by the backend, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) | Self::Url(_) => None,
        }
    }

    /// True when the request never produced a backend answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Operations the storefront needs from the marketplace backend.
///
/// Every method is a single request; callers decide what to do on failure.
pub trait StorefrontApi: Send + Sync {
    /// `GET /api/states` - all producing states keyed by slug.
    fn states(&self)
    -> impl Future<Output = Result<BTreeMap<String, StateInfo>, ApiError>> + Send;

    /// `GET /api/states/{name}`.
    fn state(&self, name: &str) -> impl Future<Output = Result<StateInfo, ApiError>> + Send;

    /// `GET /api/products?state=&category=`.
    fn products(
        &self,
        filter: &ProductFilter,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `GET /api/products/{id}`.
    fn product(&self, id: &ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// `POST /api/cart/add` - the backend merges into an existing line.
    fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> impl Future<Output = Result<CartItem, ApiError>> + Send;

    /// `GET /api/cart/{session}` - the full enriched cart.
    fn cart(&self, session: &SessionId)
    -> impl Future<Output = Result<Vec<CartLine>, ApiError>> + Send;

    /// `PUT /api/cart/{session}/{product}?quantity=N`; `quantity` is not validated.
    fn update_cart_quantity(
        &self,
        session: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/cart/{session}/{product}`.
    fn remove_from_cart(
        &self,
        session: &SessionId,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /api/checkout/create-session`.
    fn create_checkout_session(
        &self,
        origin_url: &str,
        session: &SessionId,
    ) -> impl Future<Output = Result<CheckoutRedirect, ApiError>> + Send;

    /// `GET /api/checkout/status/{id}`.
    fn checkout_status(
        &self,
        id: &PaymentSessionId,
    ) -> impl Future<Output = Result<PaymentSession, ApiError>> + Send;

    /// `GET /api/auth/me` - the user behind the current cookie or token.
    fn me(&self) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// `POST /api/auth/login` - exchange a redirect session id for a user.
    fn login(&self, session_id: &str) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// `POST /api/auth/logout`.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}
