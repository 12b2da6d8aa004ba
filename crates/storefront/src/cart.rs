//! Cart synchronization against the backend.
//!
//! The backend owns the cart. Every mutation is followed by a full refetch
//! that replaces the local snapshot; nothing is updated optimistically and
//! nothing is merged locally. A refetch runs even when the mutation itself
//! failed, so the displayed cart always matches what the backend reports.

use tokio::sync::RwLock;
use tracing::instrument;

use agrimap_core::{Cart, Price, ProductId, SessionId};

use crate::api::{ApiError, StorefrontApi};
use crate::error::{AppError, add_breadcrumb};
use crate::notify::Notifications;

/// Client-side view of one session's cart.
pub struct CartSynchronizer<A> {
    api: A,
    session_id: SessionId,
    cart: RwLock<Cart>,
    notifications: Notifications,
}

impl<A: StorefrontApi> CartSynchronizer<A> {
    /// Start with an empty snapshot; call [`Self::refresh`] to load.
    #[must_use]
    pub fn new(api: A, session_id: SessionId, notifications: Notifications) -> Self {
        Self {
            api,
            session_id,
            cart: RwLock::new(Cart::default()),
            notifications,
        }
    }

    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Add `quantity` units; the backend merges into an existing line.
    ///
    /// # Errors
    ///
    /// Returns error if the add or the following refresh fails.
    #[instrument(skip(self), fields(session = %self.session_id, product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: i64) -> Result<Cart, AppError> {
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", &quantity.to_string()),
            ]),
        );

        let outcome = self
            .api
            .add_to_cart(&self.session_id, product_id, quantity)
            .await
            .map(|_| ());
        self.settle(outcome, "Added to cart!", "Failed to add to cart")
            .await
    }

    /// Set a line's quantity. Zero or negative values are sent as-is and the
    /// backend drops the line.
    ///
    /// # Errors
    ///
    /// Returns error if the update or the following refresh fails.
    #[instrument(skip(self), fields(session = %self.session_id, product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, AppError> {
        add_breadcrumb(
            "cart",
            "Updated cart quantity",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", &quantity.to_string()),
            ]),
        );

        let outcome = self
            .api
            .update_cart_quantity(&self.session_id, product_id, quantity)
            .await;
        self.settle(outcome, "Cart updated", "Failed to update cart")
            .await
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// Returns error if the removal or the following refresh fails.
    #[instrument(skip(self), fields(session = %self.session_id, product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Cart, AppError> {
        add_breadcrumb(
            "cart",
            "Removed from cart",
            Some(&[("product_id", product_id.as_str())]),
        );

        let outcome = self
            .api
            .remove_from_cart(&self.session_id, product_id)
            .await;
        self.settle(outcome, "Item removed from cart", "Failed to remove item")
            .await
    }

    /// Replace the snapshot with the backend's current cart.
    ///
    /// On failure the previous snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns error if the cart could not be fetched.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn refresh(&self) -> Result<Cart, AppError> {
        match self.api.cart(&self.session_id).await {
            Ok(lines) => {
                let cart = Cart::from(lines);
                *self.cart.write().await = cart.clone();
                tracing::debug!(lines = cart.lines().len(), "Cart refreshed");
                Ok(cart)
            }
            Err(e) => {
                self.notifications.error("Failed to load cart");
                let err = AppError::from(e);
                err.report();
                Err(err)
            }
        }
    }

    /// Current snapshot.
    pub async fn items(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Units across all lines, for the cart badge.
    pub async fn item_count(&self) -> i64 {
        self.cart.read().await.item_count()
    }

    /// Display subtotal from the backend's line totals.
    pub async fn subtotal(&self) -> Price {
        self.cart.read().await.subtotal()
    }

    async fn settle(
        &self,
        outcome: Result<(), ApiError>,
        success: &str,
        failure: &str,
    ) -> Result<Cart, AppError> {
        let outcome = outcome.map_err(|e| {
            self.notifications.error(failure);
            let err = AppError::from(e);
            err.report();
            err
        });
        if outcome.is_ok() {
            self.notifications.success(success);
        }

        let refreshed = self.refresh().await;
        outcome?;
        refreshed
    }
}
