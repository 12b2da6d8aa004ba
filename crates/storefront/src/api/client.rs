//! `reqwest` implementation of [`StorefrontApi`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use agrimap_core::{
    CartItem, CartLine, PaymentSession, PaymentSessionId, Product, ProductId, SessionId,
    StateInfo, User,
};

use super::types::{
    AddToCartRequest, CheckoutRedirect, CreateCheckoutRequest, ErrorBody, LoginRequest,
    LoginResponse, ProductFilter,
};
use super::{ApiError, StorefrontApi};
use crate::config::StorefrontConfig;

/// HTTP client for the marketplace backend.
///
/// Cheap to clone; clones share the connection pool, the cookie jar, and the
/// bearer token.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    session_token: RwLock<Option<SecretString>>,
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        let token = config
            .session_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_owned()));

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                session_token: RwLock::new(token),
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether a bearer token is currently attached to requests.
    #[must_use]
    pub fn has_session_token(&self) -> bool {
        self.inner
            .session_token
            .read()
            .is_ok_and(|token| token.is_some())
    }

    fn set_session_token(&self, token: Option<SecretString>) {
        if let Ok(mut slot) = self.inner.session_token.write() {
            *slot = token;
        }
    }

    /// Build `<base>/api/<segments...>` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Parse(format!("{} cannot be a base URL", self.inner.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token (if any), send, and map error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let bearer = self
            .inner
            .session_token
            .read()
            .ok()
            .and_then(|token| {
                token
                    .as_ref()
                    .map(|t| format!("Bearer {}", t.expose_secret()))
            });
        let request = match bearer {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |error| error.message(),
        );

        tracing::debug!(status = %status, message = %message, "Backend returned non-success status");

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send and decode a JSON body.
    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

impl StorefrontApi for BackendClient {
    #[instrument(skip(self))]
    async fn states(&self) -> Result<BTreeMap<String, StateInfo>, ApiError> {
        let url = self.endpoint(&["states"])?;
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn state(&self, name: &str) -> Result<StateInfo, ApiError> {
        let url = self.endpoint(&["states", name])?;
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        if filter.state.is_some() || filter.category.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(state) = &filter.state {
                query.append_pair("state", state);
            }
            if let Some(category) = &filter.category {
                query.append_pair("category", category);
            }
        }
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self), fields(session = %session, product_id = %product_id))]
    async fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartItem, ApiError> {
        let url = self.endpoint(&["cart", "add"])?;
        let body = AddToCartRequest {
            product_id,
            quantity,
            user_session: session,
        };
        self.json(self.inner.client.post(url).json(&body)).await
    }

    #[instrument(skip(self), fields(session = %session))]
    async fn cart(&self, session: &SessionId) -> Result<Vec<CartLine>, ApiError> {
        let url = self.endpoint(&["cart", session.as_str()])?;
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self), fields(session = %session, product_id = %product_id))]
    async fn update_cart_quantity(
        &self,
        session: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        let mut url = self.endpoint(&["cart", session.as_str(), product_id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("quantity", &quantity.to_string());
        self.send(self.inner.client.put(url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(session = %session, product_id = %product_id))]
    async fn remove_from_cart(
        &self,
        session: &SessionId,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", session.as_str(), product_id.as_str()])?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(session = %session))]
    async fn create_checkout_session(
        &self,
        origin_url: &str,
        session: &SessionId,
    ) -> Result<CheckoutRedirect, ApiError> {
        let url = self.endpoint(&["checkout", "create-session"])?;
        let body = CreateCheckoutRequest {
            origin_url,
            user_session: session,
        };
        self.json(self.inner.client.post(url).json(&body)).await
    }

    #[instrument(skip(self), fields(payment_session = %id))]
    async fn checkout_status(&self, id: &PaymentSessionId) -> Result<PaymentSession, ApiError> {
        let url = self.endpoint(&["checkout", "status", id.as_str()])?;
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn me(&self) -> Result<User, ApiError> {
        let url = self.endpoint(&["auth", "me"])?;
        self.json(self.inner.client.get(url)).await
    }

    #[instrument(skip(self, session_id))]
    async fn login(&self, session_id: &str) -> Result<User, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let response: LoginResponse = self
            .json(
                self.inner
                    .client
                    .post(url)
                    .json(&LoginRequest { session_id }),
            )
            .await?;

        if let Some(token) = response.session_token {
            self.set_session_token(Some(SecretString::from(token)));
        }

        Ok(response.user)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "logout"])?;
        let result = self.send(self.inner.client.post(url)).await.map(|_| ());

        // Local credentials go regardless of what the backend said
        self.set_session_token(None);
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> BackendClient {
        BackendClient::new(&StorefrontConfig::for_api(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_api() {
        let client = client_for("http://localhost:8001");
        let url = client.endpoint(&["cart", "add"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/api/cart/add");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client_for("https://market.example/shop/");
        let url = client.endpoint(&["states"]).unwrap();
        assert_eq!(url.as_str(), "https://market.example/shop/api/states");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client_for("http://localhost:8001");
        let url = client
            .endpoint(&["cart", "session 1", "a/b"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8001/api/cart/session%201/a%2Fb"
        );
    }

    #[test]
    fn test_session_token_from_config() {
        let mut config = StorefrontConfig::for_api(Url::parse("http://localhost:8001").unwrap());
        assert!(!BackendClient::new(&config).unwrap().has_session_token());

        config.session_token = Some(SecretString::from("tok_123"));
        let client = BackendClient::new(&config).unwrap();
        assert!(client.has_session_token());

        client.set_session_token(None);
        assert!(!client.has_session_token());
    }
}
