//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the library surface. Flows return
//! `Result<T, AppError>` after they have already notified the user; callers
//! use [`AppError::user_message`] for fallback screens and never show the
//! `Display` output, which can carry backend details.

use thiserror::Error;

use agrimap_core::User;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Copy suitable for a toast or fallback screen.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => match err {
                ApiError::Http(_) => {
                    "Could not reach the marketplace. Please try again.".to_string()
                }
                ApiError::Unauthorized(_) => "Please sign in to continue".to_string(),
                ApiError::NotFound(detail) => detail.clone(),
                ApiError::Api { status, message } if *status < 500 => message.clone(),
                _ => "Something went wrong on our side".to_string(),
            },
            Self::Config(_) | Self::Internal(_) => "Something went wrong on our side".to_string(),
        }
    }

    /// Log the error and capture the server-side kinds to Sentry.
    pub fn report(&self) {
        let capture = match self {
            Self::Api(err) => err.is_transport() || err.status().is_some_and(|s| s >= 500),
            Self::Internal(_) => true,
            Self::Config(_) => false,
        };

        if capture {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::warn!(error = %self, "Storefront error");
        }
    }
}

/// Set the Sentry user context from a signed-in user.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.to_string()),
            username: Some(user.name.clone()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
