//! Storefront state shared across page loads.

use std::sync::Arc;

use url::Url;

use agrimap_core::{PaymentSessionId, User};

use crate::api::{BackendClient, StorefrontApi};
use crate::auth::AuthBootstrapper;
use crate::cart::CartSynchronizer;
use crate::catalog::Catalog;
use crate::checkout::CheckoutInitiator;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::notify::Notifications;
use crate::pages::{self, Navigation, Page};
use crate::payment::{Clock, PaymentPoller, PaymentState, PollHandle, TokioClock};
use crate::session::SessionContext;

/// What a page shows after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Shop,
    Profile(User),
    Payment(PaymentState),
    Cancelled,
    Redirect(&'static str),
}

/// Result of [`Storefront::load`].
#[derive(Debug, Clone)]
pub struct PageLoad {
    /// URL as it should now appear (auth fragment removed).
    pub url: Url,
    /// Fresh cart session for this load.
    pub session: SessionContext,
    pub user: Option<User>,
    pub page: PageState,
}

/// The storefront: one backend client plus every flow built on it.
///
/// This struct is cheaply cloneable via `Arc`. Cart state is per session,
/// so carts are created on demand with [`Storefront::cart`].
pub struct Storefront<A = BackendClient, C = TokioClock> {
    inner: Arc<StorefrontInner<A, C>>,
}

struct StorefrontInner<A, C> {
    config: StorefrontConfig,
    api: A,
    clock: C,
    notifications: Notifications,
    catalog: Catalog<A>,
    checkout: CheckoutInitiator<A>,
    auth: AuthBootstrapper<A>,
}

impl<A, C> Clone for Storefront<A, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Storefront {
    /// Create a storefront talking to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let api = BackendClient::new(&config)?;
        Ok(Self::with_api(api, TokioClock, config))
    }
}

impl<A, C> Storefront<A, C>
where
    A: StorefrontApi + Clone + 'static,
    C: Clock + Clone,
{
    /// Create a storefront over any API implementation and clock.
    #[must_use]
    pub fn with_api(api: A, clock: C, config: StorefrontConfig) -> Self {
        let notifications = Notifications::new();

        Self {
            inner: Arc::new(StorefrontInner {
                catalog: Catalog::new(
                    api.clone(),
                    config.catalog_cache_ttl,
                    notifications.clone(),
                ),
                checkout: CheckoutInitiator::new(api.clone(), notifications.clone()),
                auth: AuthBootstrapper::new(api.clone(), notifications.clone()),
                config,
                api,
                clock,
                notifications,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.inner.notifications
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog<A> {
        &self.inner.catalog
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutInitiator<A> {
        &self.inner.checkout
    }

    #[must_use]
    pub fn auth(&self) -> &AuthBootstrapper<A> {
        &self.inner.auth
    }

    /// Fresh session context for the configured origin.
    #[must_use]
    pub fn new_session(&self) -> SessionContext {
        SessionContext::generate(self.inner.config.origin_url.clone())
    }

    /// Cart for one session. The snapshot starts empty.
    #[must_use]
    pub fn cart(&self, session: &SessionContext) -> CartSynchronizer<A> {
        CartSynchronizer::new(
            self.inner.api.clone(),
            session.session_id.clone(),
            self.inner.notifications.clone(),
        )
    }

    #[must_use]
    pub fn poller(&self) -> PaymentPoller<A, C> {
        PaymentPoller::with_clock(
            self.inner.api.clone(),
            self.inner.clock.clone(),
            self.inner.config.poll,
        )
    }

    /// Start confirming a payment in the background.
    #[must_use]
    pub fn confirm_payment(&self, id: PaymentSessionId) -> PollHandle {
        self.poller().spawn(id)
    }

    /// Run one page load for `url`.
    ///
    /// Generates a new session context, resolves who is signed in, routes the
    /// page, and on a payment return polls until the payment settles.
    #[tracing::instrument(skip(self, url), fields(path = %url.path()))]
    pub async fn load(&self, url: &Url) -> PageLoad {
        let session = self.new_session();
        let auth = self.inner.auth.bootstrap(url).await;

        let page = match pages::resolve(&auth.url, auth.user.as_ref()) {
            Navigation::Redirect(to) => PageState::Redirect(to),
            Navigation::Render(Page::Shop) => PageState::Shop,
            Navigation::Render(Page::Profile(user)) => PageState::Profile(user),
            Navigation::Render(Page::Cancelled) => PageState::Cancelled,
            Navigation::Render(Page::PaymentReturn(Some(id))) => {
                PageState::Payment(self.poller().poll(&id).await)
            }
            Navigation::Render(Page::PaymentReturn(None)) => {
                tracing::warn!("Payment return without a session id");
                PageState::Payment(PaymentState::Error)
            }
        };

        PageLoad {
            url: auth.url,
            session,
            user: auth.user,
            page,
        }
    }

    /// Sign out of the backend.
    ///
    /// # Errors
    ///
    /// Returns error if the backend logout request fails.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.inner.auth.logout().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agrimap_core::{CheckoutStatus, PaymentStatus};

    use super::*;
    use crate::testing::{FakeApi, Op, RecordingClock, payment, sample_user};

    fn storefront() -> (FakeApi, Storefront<FakeApi, RecordingClock>) {
        let api = FakeApi::new();
        let config =
            StorefrontConfig::for_api(Url::parse("https://mapfresh.example").unwrap());
        let storefront = Storefront::with_api(api.clone(), RecordingClock::default(), config);
        (api, storefront)
    }

    fn url(path: &str) -> Url {
        Url::parse("https://mapfresh.example").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_each_load_gets_new_session() {
        let (_, storefront) = storefront();

        let a = storefront.load(&url("/")).await;
        let b = storefront.load(&url("/")).await;

        assert_eq!(a.page, PageState::Shop);
        assert_ne!(a.session.session_id, b.session.session_id);
    }

    #[tokio::test]
    async fn test_profile_without_user_redirects() {
        let (api, storefront) = storefront();

        let load = storefront.load(&url("/profile")).await;

        assert_eq!(load.page, PageState::Redirect("/"));
        assert_eq!(api.calls(Op::Login), 0);
    }

    #[tokio::test]
    async fn test_profile_with_fragment_renders_after_exchange() {
        let (api, storefront) = storefront();
        let user = sample_user("user-1");
        api.accept_login("abc123", user.clone());

        let load = storefront
            .load(&url("/profile#session_id=abc123"))
            .await;

        assert_eq!(load.page, PageState::Profile(user));
        assert_eq!(load.url.as_str(), "https://mapfresh.example/profile");
        assert_eq!(api.call_args(Op::Login), vec!["abc123"]);
    }

    #[tokio::test]
    async fn test_success_page_polls() {
        let (api, storefront) = storefront();
        api.push_status(payment(PaymentStatus::Paid, CheckoutStatus::Complete));

        let load = storefront
            .load(&url("/success?session_id=cs_test_1"))
            .await;

        assert!(matches!(load.page, PageState::Payment(PaymentState::Success(_))));
        assert_eq!(api.call_args(Op::CheckoutStatus), vec!["cs_test_1"]);
    }

    #[tokio::test]
    async fn test_success_without_session_id_is_error() {
        let (api, storefront) = storefront();

        let load = storefront.load(&url("/success")).await;

        assert_eq!(load.page, PageState::Payment(PaymentState::Error));
        assert_eq!(api.calls(Op::CheckoutStatus), 0);
    }

    #[tokio::test]
    async fn test_cart_shares_backend_across_handles() {
        let (api, storefront) = storefront();
        api.add_product(crate::testing::sample_product("wheat", "Golden Wheat", 25));
        let session = storefront.new_session();

        storefront
            .cart(&session)
            .add(&agrimap_core::ProductId::new("wheat"), 2)
            .await
            .unwrap();
        let cart = storefront.cart(&session);
        cart.refresh().await.unwrap();

        assert_eq!(cart.item_count().await, 2);
    }
}
