//! Cache types for catalog responses.

use std::collections::BTreeMap;

use agrimap_core::{Product, StateInfo};

use crate::api::ProductFilter;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    States,
    State(String),
    Products(ProductFilter),
    Product(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    States(BTreeMap<String, StateInfo>),
    State(Box<StateInfo>),
    Products(Vec<Product>),
    Product(Box<Product>),
}
