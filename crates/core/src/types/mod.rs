//! Core types for AgriMap Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod session;
pub mod status;

pub use email::Email;
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use session::SessionId;
pub use status::*;
