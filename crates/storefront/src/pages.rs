//! Page routing: which page a URL shows, given who is signed in.

use url::Url;

use agrimap_core::{PaymentSessionId, User};

/// Path every redirect and recovery action leads to.
pub const SHOP_PATH: &str = "/";

/// A page the storefront can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Map and catalog.
    Shop,
    /// Signed-in user's profile.
    Profile(User),
    /// Return from the payment provider; `None` when the query lacks
    /// `session_id`.
    PaymentReturn(Option<PaymentSessionId>),
    /// Customer backed out of the payment page.
    Cancelled,
}

/// Outcome of resolving a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Page),
    Redirect(&'static str),
}

/// Resolve `url` for the given sign-in state.
///
/// Call after the auth bootstrap has run, so a profile visit carrying an auth
/// fragment already sees the exchanged user. Unknown paths go to the shop.
#[must_use]
pub fn resolve(url: &Url, user: Option<&User>) -> Navigation {
    match url.path().trim_end_matches('/') {
        "" => Navigation::Render(Page::Shop),
        "/profile" => user.map_or(Navigation::Redirect(SHOP_PATH), |user| {
            Navigation::Render(Page::Profile(user.clone()))
        }),
        "/success" => Navigation::Render(Page::PaymentReturn(payment_session_from_query(url))),
        "/cancel" => Navigation::Render(Page::Cancelled),
        other => {
            tracing::debug!(path = other, "Unknown page, redirecting to shop");
            Navigation::Redirect(SHOP_PATH)
        }
    }
}

fn payment_session_from_query(url: &Url) -> Option<PaymentSessionId> {
    url.query_pairs()
        .find(|(key, _)| key == "session_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(PaymentSessionId::new)
}
