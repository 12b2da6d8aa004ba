//! Status enums reported by the payment integration.
//!
//! Both enums mirror the strings the payment provider uses. Values this
//! client does not know about decode to `Unknown` instead of failing, so a
//! provider-side addition cannot break status polling.

use serde::{Deserialize, Serialize};

/// Whether the checkout session has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

/// Lifecycle of the checkout session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    #[default]
    Open,
    Complete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "paid"),
            Self::Unpaid => write!(f, "unpaid"),
            Self::NoPaymentRequired => write!(f, "no_payment_required"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Complete => write!(f, "complete"),
            Self::Expired => write!(f, "expired"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
