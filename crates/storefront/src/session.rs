//! Per-page-load session context.

use agrimap_core::SessionId;
use url::Url;

/// Identity of one page load: the cart session key and the origin the
/// payment provider returns to.
///
/// Created once per load and passed explicitly to cart and checkout calls.
/// Nothing is persisted, so a reload starts an empty cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub origin_url: Url,
}

impl SessionContext {
    /// Fresh context with a newly generated session id.
    #[must_use]
    pub fn generate(origin_url: Url) -> Self {
        Self {
            session_id: SessionId::generate(),
            origin_url,
        }
    }

    /// Context for an existing session id (e.g. from the command line).
    #[must_use]
    pub const fn resume(session_id: SessionId, origin_url: Url) -> Self {
        Self {
            session_id,
            origin_url,
        }
    }

    /// Origin as sent to the checkout endpoint, without a trailing slash.
    #[must_use]
    pub fn origin(&self) -> &str {
        self.origin_url.as_str().trim_end_matches('/')
    }
}
