//! Cart and checkout commands.
//!
//! The CLI has no page to keep a session alive, so every command takes the
//! session explicitly. `cart add` without `--session` starts a new one and
//! prints it.

use agrimap_core::{ProductId, SessionId};
use agrimap_storefront::Storefront;
use agrimap_storefront::session::SessionContext;

use super::CommandError;
use crate::output;

fn resume(storefront: &Storefront, session: &str) -> SessionContext {
    SessionContext::resume(
        SessionId::new(session),
        storefront.config().origin_url.clone(),
    )
}

/// Show a session's cart.
pub async fn show(storefront: &Storefront, session: &str) -> Result<(), CommandError> {
    let cart = storefront.cart(&resume(storefront, session)).refresh().await?;
    output::cart(&cart);
    Ok(())
}

/// Add a product, starting a new session when none is given.
pub async fn add(
    storefront: &Storefront,
    session: Option<&str>,
    product_id: &str,
    quantity: i64,
) -> Result<(), CommandError> {
    let ctx = session.map_or_else(
        || storefront.new_session(),
        |session| resume(storefront, session),
    );
    output::session(ctx.session_id.as_str());

    let cart = storefront
        .cart(&ctx)
        .add(&ProductId::new(product_id), quantity)
        .await?;
    output::cart(&cart);
    Ok(())
}

/// Set a line's quantity.
pub async fn update(
    storefront: &Storefront,
    session: &str,
    product_id: &str,
    quantity: i64,
) -> Result<(), CommandError> {
    let cart = storefront
        .cart(&resume(storefront, session))
        .update_quantity(&ProductId::new(product_id), quantity)
        .await?;
    output::cart(&cart);
    Ok(())
}

/// Remove a line.
pub async fn remove(
    storefront: &Storefront,
    session: &str,
    product_id: &str,
) -> Result<(), CommandError> {
    let cart = storefront
        .cart(&resume(storefront, session))
        .remove(&ProductId::new(product_id))
        .await?;
    output::cart(&cart);
    Ok(())
}

/// Create a payment session and print where to pay.
pub async fn checkout(storefront: &Storefront, session: &str) -> Result<(), CommandError> {
    let redirect = storefront
        .checkout()
        .create_session(&resume(storefront, session))
        .await?;

    output::line(&format!("Pay at: {}", redirect.url));
    output::line(&format!(
        "Then run: agrimap confirm {}",
        redirect.session_id
    ));
    Ok(())
}
