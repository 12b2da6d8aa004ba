//! AgriMap Market storefront client library.
//!
//! A thin client over the marketplace REST backend: catalog browsing, a
//! server-owned cart keyed by a per-load session id, checkout redirects,
//! payment confirmation polling, and cookie/token authentication.
//!
//! # Modules
//!
//! - [`api`] - `StorefrontApi` trait and its `reqwest` implementation
//! - [`catalog`] - cached state and product reads
//! - [`cart`] - cart mutations with refetch-after-write
//! - [`checkout`] - payment session creation
//! - [`payment`] - cancellable payment status poller
//! - [`auth`] - who-am-I check and redirect fragment exchange
//! - [`pages`] - URL to page routing
//! - [`state`] - `Storefront`, tying the flows together per page load

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notify;
pub mod pages;
pub mod payment;
pub mod session;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use config::StorefrontConfig;
pub use error::AppError;
pub use state::{PageLoad, PageState, Storefront};
