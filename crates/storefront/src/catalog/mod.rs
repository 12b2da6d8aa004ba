//! Catalog reads: producing states and products.
//!
//! Responses are cached in memory for the configured TTL (5 minutes by
//! default). The catalog never changes from the storefront's side, so there
//! is no write-through; [`Catalog::invalidate_all`] drops everything.

mod cache;

use std::collections::BTreeMap;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use agrimap_core::{Product, ProductId, StateInfo};

use crate::api::{ApiError, ProductFilter, StorefrontApi};
use crate::error::AppError;
use crate::notify::Notifications;

use cache::{CacheKey, CacheValue};

/// Cached reader over the catalog endpoints.
pub struct Catalog<A> {
    api: A,
    cache: Cache<CacheKey, CacheValue>,
    notifications: Notifications,
}

impl<A: StorefrontApi> Catalog<A> {
    /// Create a catalog reader whose entries live for `ttl`.
    #[must_use]
    pub fn new(api: A, ttl: Duration, notifications: Notifications) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            api,
            cache,
            notifications,
        }
    }

    /// All producing states keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn states(&self) -> Result<BTreeMap<String, StateInfo>, AppError> {
        if let Some(CacheValue::States(states)) = self.cache.get(&CacheKey::States).await {
            debug!("Cache hit for states");
            return Ok(states);
        }

        let states = self
            .api
            .states()
            .await
            .map_err(|e| self.failed("Failed to load states", e))?;

        self.cache
            .insert(CacheKey::States, CacheValue::States(states.clone()))
            .await;

        Ok(states)
    }

    /// A single state by slug.
    ///
    /// # Errors
    ///
    /// Returns error if the state does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn state(&self, name: &str) -> Result<StateInfo, AppError> {
        let key = CacheKey::State(name.to_string());
        if let Some(CacheValue::State(state)) = self.cache.get(&key).await {
            debug!("Cache hit for state");
            return Ok(*state);
        }

        let state = self
            .api
            .state(name)
            .await
            .map_err(|e| self.failed("State not found", e))?;

        self.cache
            .insert(key, CacheValue::State(Box::new(state.clone())))
            .await;

        Ok(state)
    }

    /// Products matching `filter`; an empty filter lists everything.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let key = CacheKey::Products(filter.clone());
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!(count = products.len(), "Cache hit for products");
            return Ok(products);
        }

        let products = self
            .api
            .products(filter)
            .await
            .map_err(|e| self.failed("Failed to load products", e))?;

        self.cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, AppError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self
            .api
            .product(id)
            .await
            .map_err(|e| self.failed("Product not found", e))?;

        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    fn failed(&self, not_found_copy: &str, err: ApiError) -> AppError {
        let message = match &err {
            ApiError::NotFound(_) => not_found_copy.to_string(),
            _ => "Failed to load the catalog".to_string(),
        };
        self.notifications.error(message);

        let err = AppError::from(err);
        err.report();
        err
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::NoticeLevel;
    use crate::testing::{FakeApi, Op, sample_product, sample_state};

    fn catalog(api: &FakeApi) -> (Catalog<FakeApi>, Notifications) {
        let notifications = Notifications::new();
        (
            Catalog::new(api.clone(), Duration::from_secs(300), notifications.clone()),
            notifications,
        )
    }

    #[tokio::test]
    async fn test_products_cached_within_ttl() {
        let api = FakeApi::new();
        api.add_product(sample_product("p1", "Golden Wheat", 25));
        let (catalog, _) = catalog(&api);

        let filter = ProductFilter::default();
        let first = catalog.products(&filter).await.unwrap();
        let second = catalog.products(&filter).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(api.calls(Op::Products), 1);
    }

    #[tokio::test]
    async fn test_filters_are_cached_separately() {
        let api = FakeApi::new();
        let (catalog, _) = catalog(&api);

        catalog.products(&ProductFilter::default()).await.unwrap();
        catalog
            .products(&ProductFilter::state("punjab"))
            .await
            .unwrap();
        catalog
            .products(&ProductFilter::state("punjab"))
            .await
            .unwrap();

        assert_eq!(api.calls(Op::Products), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_refetches() {
        let api = FakeApi::new();
        let (catalog, _) = catalog(&api);

        catalog.states().await.unwrap();
        catalog.invalidate_all().await;
        catalog.states().await.unwrap();

        assert_eq!(api.calls(Op::States), 2);
    }

    #[tokio::test]
    async fn test_state_lookup() {
        let api = FakeApi::new();
        api.add_state("kerala", sample_state("Kerala"));
        let (catalog, notifications) = catalog(&api);

        assert_eq!(catalog.state("kerala").await.unwrap().name, "Kerala");
        assert_eq!(catalog.states().await.unwrap().len(), 1);
        assert!(catalog.state("atlantis").await.is_err());
        assert_eq!(notifications.drain()[0].message, "State not found");

        catalog.state("kerala").await.unwrap();
        assert_eq!(api.calls(Op::State), 2);
    }

    #[tokio::test]
    async fn test_missing_product_notifies() {
        let api = FakeApi::new();
        let (catalog, notifications) = catalog(&api);

        let result = catalog.product(&ProductId::new("missing")).await;

        assert!(matches!(
            result,
            Err(AppError::Api(ApiError::NotFound(_)))
        ));
        let notices = notifications.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Product not found");
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let api = FakeApi::new();
        api.fail(Op::States);
        let (catalog, _) = catalog(&api);

        assert!(catalog.states().await.is_err());
        api.recover(Op::States);
        assert!(catalog.states().await.is_ok());
        assert_eq!(api.calls(Op::States), 2);
    }
}
