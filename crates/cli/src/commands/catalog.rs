//! Catalog commands.

use agrimap_core::ProductId;
use agrimap_storefront::Storefront;
use agrimap_storefront::api::ProductFilter;

use super::CommandError;
use crate::output;

/// List producing states.
pub async fn states(storefront: &Storefront) -> Result<(), CommandError> {
    let states = storefront.catalog().states().await?;
    tracing::debug!(count = states.len(), "Loaded states");
    output::states(&states);
    Ok(())
}

/// List products, optionally narrowed by state and category.
pub async fn products(
    storefront: &Storefront,
    state: Option<String>,
    category: Option<String>,
) -> Result<(), CommandError> {
    let filter = ProductFilter { state, category };
    let products = storefront.catalog().products(&filter).await?;
    output::products(&products);
    Ok(())
}

/// Show one product.
pub async fn product(storefront: &Storefront, id: &str) -> Result<(), CommandError> {
    let product = storefront.catalog().product(&ProductId::new(id)).await?;
    output::product(&product);
    Ok(())
}
