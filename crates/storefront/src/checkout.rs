//! Checkout session creation.

use tracing::instrument;

use crate::api::{CheckoutRedirect, StorefrontApi};
use crate::error::{AppError, add_breadcrumb};
use crate::notify::Notifications;
use crate::session::SessionContext;

/// Requests hosted payment pages from the backend.
///
/// No idempotency key is sent: two calls create two payment sessions.
pub struct CheckoutInitiator<A> {
    api: A,
    notifications: Notifications,
}

impl<A: StorefrontApi> CheckoutInitiator<A> {
    #[must_use]
    pub const fn new(api: A, notifications: Notifications) -> Self {
        Self { api, notifications }
    }

    /// Create a payment session for the context's cart.
    ///
    /// On success the caller should navigate to `redirect.url` straight away.
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses (e.g. empty cart) or is unreachable.
    #[instrument(skip(self, ctx), fields(session = %ctx.session_id))]
    pub async fn create_session(&self, ctx: &SessionContext) -> Result<CheckoutRedirect, AppError> {
        add_breadcrumb(
            "checkout",
            "Checkout started",
            Some(&[("session", ctx.session_id.as_str())]),
        );

        match self
            .api
            .create_checkout_session(ctx.origin(), &ctx.session_id)
            .await
        {
            Ok(redirect) => {
                tracing::info!(payment_session = %redirect.session_id, "Checkout session created");
                Ok(redirect)
            }
            Err(e) => {
                self.notifications.error("Failed to create checkout session");
                let err = AppError::from(e);
                err.report();
                Err(err)
            }
        }
    }
}
