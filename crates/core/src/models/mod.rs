//! Wire records returned by the marketplace backend.
//!
//! The backend owns and persists every one of these. The client keeps
//! transient copies and never recomputes derived values such as line totals.

pub mod cart;
pub mod payment;
pub mod product;
pub mod region;
pub mod user;

pub use cart::{Cart, CartItem, CartLine};
pub use payment::PaymentSession;
pub use product::Product;
pub use region::{Coordinates, StateInfo};
pub use user::User;
