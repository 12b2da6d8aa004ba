//! AgriMap Market Core - Shared types library.
//!
//! This crate provides the types shared by the storefront client components:
//! - `storefront` - Client library for the marketplace REST backend
//! - `cli` - Command-line front end driving the storefront flows
//! - `integration-tests` - Fake backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O and no HTTP clients. Every
//! record here is a transient copy of something the backend owns.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, the cart session identifier, prices,
//!   emails, and payment statuses
//! - [`models`] - Wire records returned by the backend (products, cart lines,
//!   users, payment sessions, states)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
