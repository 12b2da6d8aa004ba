//! Page loads and session management.

use url::Url;

use agrimap_storefront::{PageState, Storefront};

use super::CommandError;
use crate::output;

/// Load a page the way a browser visit would.
pub async fn open(storefront: &Storefront, target: &str) -> Result<(), CommandError> {
    let url = match Url::parse(target) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            storefront.config().origin_url.join(target)?
        }
        Err(e) => return Err(e.into()),
    };

    let load = storefront.load(&url).await;

    output::line(&format!("URL: {}", load.url));
    output::session(load.session.session_id.as_str());
    output::user(load.user.as_ref());

    match &load.page {
        PageState::Shop => output::line("Shop"),
        PageState::Profile(user) => {
            output::line("Profile");
            output::line(&format!("  Name:  {}", user.name));
            output::line(&format!("  Email: {}", user.email));
        }
        PageState::Payment(state) => output::payment(state),
        PageState::Cancelled => {
            output::line("Payment Cancelled");
            output::line("Your payment was cancelled. Your cart items are still saved.");
        }
        PageState::Redirect(to) => output::line(&format!("Redirected to {to}")),
    }
    Ok(())
}

/// Show the signed-in user.
pub async fn whoami(storefront: &Storefront) -> Result<(), CommandError> {
    let outcome = storefront
        .auth()
        .bootstrap(&storefront.config().origin_url)
        .await;
    output::user(outcome.user.as_ref());
    Ok(())
}

/// Sign out of the backend.
pub async fn logout(storefront: &Storefront) -> Result<(), CommandError> {
    storefront.logout().await?;
    Ok(())
}
