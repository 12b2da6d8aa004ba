//! Sign-in state for a page load.
//!
//! Two independent effects run on every load:
//!
//! - a who-am-I request; any failure, 401 included, just means "signed out"
//! - when the URL fragment carries `session_id=...` (the identity provider's
//!   redirect), a one-time exchange of that id for a user record
//!
//! The fragment is stripped from the returned URL so reloading the cleaned
//! URL never replays the exchange, and a recently exchanged id is never sent
//! twice by the same bootstrapper.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::{debug, instrument};
use url::Url;

use agrimap_core::User;

use crate::api::{ApiError, StorefrontApi};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::notify::Notifications;

/// Fragment key the identity provider appends on redirect.
const FRAGMENT_SESSION_KEY: &str = "session_id";

/// How many exchanged ids a bootstrapper remembers; the oldest is forgotten.
const REMEMBERED_EXCHANGES: usize = 32;

/// Result of bootstrapping auth for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Signed-in user, if any.
    pub user: Option<User>,
    /// The page URL with any auth fragment removed.
    pub url: Url,
    /// Whether the URL carried an auth fragment.
    pub had_fragment: bool,
}

/// Resolves the signed-in user for each page load.
pub struct AuthBootstrapper<A> {
    api: A,
    notifications: Notifications,
    exchanged: Mutex<VecDeque<String>>,
}

impl<A: StorefrontApi> AuthBootstrapper<A> {
    #[must_use]
    pub fn new(api: A, notifications: Notifications) -> Self {
        Self {
            api,
            notifications,
            exchanged: Mutex::new(VecDeque::with_capacity(REMEMBERED_EXCHANGES)),
        }
    }

    /// Run the who-am-I check and, when present, the fragment exchange
    /// concurrently.
    ///
    /// A successful exchange takes precedence over the who-am-I answer.
    #[instrument(skip(self, url), fields(path = %url.path()))]
    pub async fn bootstrap(&self, url: &Url) -> AuthOutcome {
        let fragment_session = session_id_from_fragment(url);
        let had_fragment = fragment_session.is_some();

        let mut cleaned = url.clone();
        if had_fragment {
            cleaned.set_fragment(None);
        }

        let exchange = fragment_session
            .as_deref()
            .filter(|session_id| self.claim(session_id));

        let (current, exchanged) = tokio::join!(self.who_am_i(), async {
            match exchange {
                Some(session_id) => self.exchange(session_id).await,
                None => None,
            }
        });

        let user = exchanged.or(current);
        match &user {
            Some(user) => set_sentry_user(user),
            None => clear_sentry_user(),
        }

        AuthOutcome {
            user,
            url: cleaned,
            had_fragment,
        }
    }

    /// Sign out. Local state is cleared even when the backend call fails.
    ///
    /// # Errors
    ///
    /// Returns error if the backend logout request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AppError> {
        let result = self.api.logout().await;
        clear_sentry_user();

        match result {
            Ok(()) => {
                self.notifications.success("Signed out");
                Ok(())
            }
            Err(e) => {
                self.notifications.error("Failed to sign out");
                let err = AppError::from(e);
                err.report();
                Err(err)
            }
        }
    }

    async fn who_am_i(&self) -> Option<User> {
        match self.api.me().await {
            Ok(user) => Some(user),
            Err(ApiError::Unauthorized(_)) => {
                debug!("No active session");
                None
            }
            Err(e) => {
                debug!(error = %e, "Who-am-I check failed, treating as signed out");
                None
            }
        }
    }

    async fn exchange(&self, session_id: &str) -> Option<User> {
        match self.api.login(session_id).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Signed in");
                self.notifications
                    .success(format!("Welcome, {}!", user.name));
                Some(user)
            }
            Err(e) => {
                self.notifications.error("Authentication failed");
                AppError::from(e).report();
                None
            }
        }
    }

    /// Record `session_id` as exchanged; false if it recently was.
    fn claim(&self, session_id: &str) -> bool {
        let Ok(mut seen) = self.exchanged.lock() else {
            return false;
        };
        if seen.iter().any(|id| id == session_id) {
            return false;
        }
        if seen.len() == REMEMBERED_EXCHANGES {
            seen.pop_front();
        }
        seen.push_back(session_id.to_string());
        true
    }
}

/// Extract `session_id` from a `#session_id=...` fragment.
#[must_use]
pub fn session_id_from_fragment(url: &Url) -> Option<String> {
    let fragment = url.fragment()?;
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == FRAGMENT_SESSION_KEY)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
